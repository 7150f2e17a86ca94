//! Scene splitting and visual prompt generation.

use std::sync::Arc;

use tracing::{debug, warn};

use storyreel_models::Scene;

use crate::error::{PipelineError, PipelineResult};
use crate::generation::TextGenerator;
use crate::prompts::{scene_split_prompt, visual_prompts_prompt, PROMPT_BREAK, SCENE_BREAK};

/// Split `text` on `delimiter`, trimming and dropping empty fragments.
fn split_fragments(text: &str, delimiter: &str) -> Vec<String> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a splitting response into scenes.
///
/// Never empty: when no usable fragment remains the whole story becomes a
/// single scene.
pub fn parse_scenes(response: &str, story: &str) -> Vec<Scene> {
    let fragments = split_fragments(response, SCENE_BREAK);
    if fragments.is_empty() {
        return Scene::from_texts(vec![story.trim().to_string()]);
    }
    Scene::from_texts(fragments)
}

/// Splits stories into scenes through a text model.
#[derive(Clone)]
pub struct SceneSplitter {
    generator: Arc<dyn TextGenerator>,
}

impl SceneSplitter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Ordered, non-empty list of scenes for `story`.
    ///
    /// Fails only when the model call fails or returns no text at all.
    pub async fn split(&self, story: &str) -> PipelineResult<Vec<Scene>> {
        let response = self
            .generator
            .generate(&scene_split_prompt(story))
            .await
            .map_err(|e| PipelineError::split_failed(e.to_string()))?;

        if response.trim().is_empty() {
            return Err(PipelineError::split_failed("model returned no text"));
        }

        let scenes = parse_scenes(&response, story);
        debug!("Story split into {} scenes", scenes.len());
        Ok(scenes)
    }

    /// Ask for `count` standalone image prompts describing the story.
    ///
    /// A different number of prompts than requested is logged and accepted.
    pub async fn generate_visual_prompts(&self, story: &str, count: usize) -> PipelineResult<Vec<String>> {
        if count == 0 {
            return Err(PipelineError::invalid_input("prompt count must be greater than zero"));
        }

        let response = self
            .generator
            .generate(&visual_prompts_prompt(story, count))
            .await?;

        let prompts = split_fragments(&response, PROMPT_BREAK);
        if prompts.is_empty() {
            return Err(PipelineError::generation_failed("model returned no visual prompts"));
        }
        if prompts.len() != count {
            warn!("Requested {} visual prompts, received {}", count, prompts.len());
        }
        Ok(prompts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Canned(PipelineResult<String>);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> PipelineResult<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(PipelineError::generation_failed(e.to_string())),
            }
        }
    }

    fn splitter(response: PipelineResult<String>) -> SceneSplitter {
        SceneSplitter::new(Arc::new(Canned(response)))
    }

    #[test]
    fn test_parse_scenes_trims_and_drops_empty() {
        let scenes = parse_scenes(
            "\n A knight rides out. <SCENE_BREAK><SCENE_BREAK>  The castle burns.\n<SCENE_BREAK>  ",
            "story",
        );
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].index, 1);
        assert_eq!(scenes[0].text, "A knight rides out.");
        assert_eq!(scenes[1].index, 2);
        assert_eq!(scenes[1].text, "The castle burns.");
    }

    #[test]
    fn test_parse_scenes_without_delimiter_is_one_scene() {
        let scenes = parse_scenes("Just one long scene.", "ignored");
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].text, "Just one long scene.");
    }

    #[test]
    fn test_parse_scenes_falls_back_to_story() {
        let scenes = parse_scenes("<SCENE_BREAK>  <SCENE_BREAK>", "  The whole story.  ");
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].index, 1);
        assert_eq!(scenes[0].text, "The whole story.");
    }

    #[tokio::test]
    async fn test_split_uses_model_output() {
        let scenes = splitter(Ok("One<SCENE_BREAK>Two".to_string()))
            .split("story")
            .await
            .unwrap();
        let texts: Vec<_> = scenes.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_split_errors() {
        let err = splitter(Err(PipelineError::generation_failed("503")))
            .split("story")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SplitFailed(_)));

        let err = splitter(Ok("   ".to_string())).split("story").await.unwrap_err();
        assert!(matches!(err, PipelineError::SplitFailed(_)));
    }

    #[tokio::test]
    async fn test_visual_prompts() {
        let s = splitter(Ok("a <PROMPT_BREAK> b <PROMPT_BREAK>".to_string()));
        assert_eq!(s.generate_visual_prompts("story", 3).await.unwrap(), vec!["a", "b"]);
        assert!(matches!(
            s.generate_visual_prompts("story", 0).await,
            Err(PipelineError::InvalidInput(_))
        ));

        let empty = splitter(Ok("<PROMPT_BREAK>".to_string()));
        assert!(empty.generate_visual_prompts("story", 2).await.is_err());
    }
}
