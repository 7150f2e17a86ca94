//! Scene types produced by splitting a story.

use serde::{Deserialize, Serialize};

/// One visualizable span of story text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// 1-based position in the story
    pub index: usize,
    /// Scene text
    pub text: String,
}

impl Scene {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Number scene texts from 1 in order.
    pub fn from_texts<I, S>(texts: I) -> Vec<Scene>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Scene::new(i + 1, text))
            .collect()
    }
}

/// Outcome of generating the image for one scene.
///
/// Carries either an image filename or an error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneResult {
    pub scene_index: usize,
    pub scene_text: String,
    pub image_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SceneResult {
    /// Scene whose image was generated and saved.
    pub fn succeeded(scene: &Scene, image_filename: impl Into<String>) -> Self {
        Self {
            scene_index: scene.index,
            scene_text: scene.text.clone(),
            image_filename: Some(image_filename.into()),
            error: None,
        }
    }

    /// Scene whose prompt refinement, generation or save failed.
    pub fn failed(scene: &Scene, error: impl Into<String>) -> Self {
        Self {
            scene_index: scene.index,
            scene_text: scene.text.clone(),
            image_filename: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.image_filename.is_some()
    }
}
