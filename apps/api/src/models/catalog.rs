use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageCategory {
    Political,
    Viral,
    AiArt,
}

/// A demo image shipped with the studio, served from the demo image directory.
#[derive(Debug, Clone, Serialize)]
pub struct PreloadedImage {
    pub id: &'static str,
    pub file_name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: ImageCategory,
}

impl PreloadedImage {
    /// Subject line used on exported reports.
    pub fn report_title(&self) -> String {
        format!("Image #{}", self.id)
    }
}

pub static PRELOADED_IMAGES: &[PreloadedImage] = &[
    PreloadedImage {
        id: "1",
        file_name: "Gemini_Generated_Image_b2gwn6b2gwn6b2gw.png",
        title: "AI Generated Portrait",
        description: "Suspected AI-generated portrait with unnatural hand positioning",
        category: ImageCategory::AiArt,
    },
    PreloadedImage {
        id: "2",
        file_name: "Gemini_Generated_Image_dcssb7dcssb7dcss.png",
        title: "Political Deepfake",
        description: "Potentially manipulated political figure",
        category: ImageCategory::Political,
    },
    PreloadedImage {
        id: "3",
        file_name: "Gemini_Generated_Image_efbbmeefbbmeefbb.png",
        title: "Viral Fake Image",
        description: "Viral social media image with suspicious artifacts",
        category: ImageCategory::Viral,
    },
    PreloadedImage {
        id: "4",
        file_name: "Gemini_Generated_Image_eo8reveo8reveo8r.png",
        title: "AI Image with Hand Issues",
        description: "Common AI generation error - malformed hands",
        category: ImageCategory::AiArt,
    },
    PreloadedImage {
        id: "5",
        file_name: "Gemini_Generated_Image_u83244u83244u832.png",
        title: "AI Text Generation Error",
        description: "Gibberish text - typical AI generation artifact",
        category: ImageCategory::AiArt,
    },
    PreloadedImage {
        id: "6",
        file_name: "Gemini_Generated_Image_y15grwy15grwy15g.png",
        title: "Anime Style AI Art",
        description: "AI-generated anime with character inconsistencies",
        category: ImageCategory::AiArt,
    },
    PreloadedImage {
        id: "7",
        file_name: "dog.jpeg",
        title: "Shiba Inu",
        description: "Shiba Inu Dog Mount Fuji Snow Cherry Blossoms",
        category: ImageCategory::AiArt,
    },
];

pub fn find_preloaded(image_id: &str) -> Option<&'static PreloadedImage> {
    PRELOADED_IMAGES.iter().find(|img| img.id == image_id)
}

/// Uploaded subject images carry this id prefix.
pub const UPLOAD_ID_PREFIX: &str = "upload-";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_preloaded_by_id() {
        let img = find_preloaded("7").unwrap();
        assert_eq!(img.title, "Shiba Inu");
        assert_eq!(img.report_title(), "Image #7");
    }

    #[test]
    fn test_unknown_id_not_preloaded() {
        assert!(find_preloaded("upload-123").is_none());
    }
}
