use crate::GenAiError;

/// Drafts an alternate ending from a screenplay excerpt and a user prompt.
#[async_trait::async_trait]
pub trait EndingGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_ending(
        &self,
        movie: &str,
        prompt: &str,
        script: &str,
    ) -> Result<String, GenAiError>;
}

/// Turns narration text into spoken audio (MP3 bytes).
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, GenAiError>;
}

/// Renders illustrative stills from a scene description (PNG bytes).
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<Vec<u8>>, GenAiError>;
}
