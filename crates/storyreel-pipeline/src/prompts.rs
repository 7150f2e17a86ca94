//! Prompt templates and prompt refinement.

use crate::error::{PipelineError, PipelineResult};
use crate::generation::TextGenerator;

/// Sentinel separating scenes in the splitting response.
pub const SCENE_BREAK: &str = "<SCENE_BREAK>";

/// Sentinel separating prompts in the visual-prompt response.
pub const PROMPT_BREAK: &str = "<PROMPT_BREAK>";

/// Ask for a richer, image-model-ready version of a short request.
pub fn refinement_prompt(request: &str) -> String {
    format!(
        "Enhance the following user request into a detailed and vivid prompt suitable for an \
         image generation model. Focus on visual details, atmosphere, and style. \
         User request: \"{}\"",
        request
    )
}

/// Ask for the story split into visual scenes separated by [`SCENE_BREAK`].
pub fn scene_split_prompt(story: &str) -> String {
    format!(
        "Analyze the following story and split it into distinct visual scenes. Each scene should \
         represent a moment or location that can be visualized as a single image. Output *only* \
         the scenes, separated by a unique delimiter like \"{brk}\". Do not add any commentary \
         before or after the scenes.\n\nStory:\n---\n{story}\n---\n\nScenes (separated by \"{brk}\"):\n",
        brk = SCENE_BREAK,
        story = story
    )
}

/// Ask for exactly `count` image prompts separated by [`PROMPT_BREAK`].
pub fn visual_prompts_prompt(story: &str, count: usize) -> String {
    format!(
        "Read the following story and write exactly {count} distinct image generation prompts \
         that together illustrate it from beginning to end. Each prompt should describe one \
         visual moment with concrete details about subjects, setting, lighting, and style. \
         Output *only* the prompts, separated by \"{brk}\". Do not number them and do not add \
         any commentary.\n\nStory:\n---\n{story}\n---\n\nPrompts (separated by \"{brk}\"):\n",
        count = count,
        brk = PROMPT_BREAK,
        story = story
    )
}

/// Turn a short request into a detailed image prompt.
pub async fn refine_prompt(generator: &dyn TextGenerator, request: &str) -> PipelineResult<String> {
    let refined = generator.generate(&refinement_prompt(request)).await?;
    let refined = refined.trim();
    if refined.is_empty() {
        return Err(PipelineError::generation_failed("Prompt refinement returned no text"));
    }
    Ok(refined.to_string())
}
