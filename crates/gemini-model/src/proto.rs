use deep_research_model::{
    GroundingMetadata as ModelGroundingMetadata, GroundingSource,
    ModelFinishReason, ModelRequest,
};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    pub search_entry_point: Option<SearchEntryPoint>,
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    #[serde(default)]
    pub web_search_queries: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntryPoint {
    pub rendered_content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebChunk>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WebChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiError,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub code: Option<u16>,
    pub message: String,
    pub status: Option<String>,
}

// -----------------------------------
// Types used in both directions
// -----------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct GoogleSearch {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_owned()),
            parts: vec![text_part(&req.content)],
        }],
        system_instruction: req.system_instruction.as_deref().map(
            |instruction| Content {
                role: None,
                parts: vec![text_part(instruction)],
            },
        ),
        // Grounding is always on.
        tools: vec![Tool {
            google_search: GoogleSearch {},
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["TEXT"],
        },
    }
}

#[inline]
fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_owned()),
        thought: None,
    }
}

impl Content {
    /// Concatenates the visible text parts, skipping model thoughts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

pub fn finish_reason(reason: &str) -> ModelFinishReason {
    match reason {
        "STOP" => ModelFinishReason::Stop,
        "MAX_TOKENS" => ModelFinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT"
        | "SPII" => ModelFinishReason::Filtered,
        _ => ModelFinishReason::Other,
    }
}

impl From<GroundingMetadata> for ModelGroundingMetadata {
    fn from(metadata: GroundingMetadata) -> Self {
        let sources = metadata
            .grounding_chunks
            .into_iter()
            .filter_map(|chunk| chunk.web)
            .filter_map(|web| {
                let uri = web.uri?;
                Some(GroundingSource {
                    title: web.title.unwrap_or_else(|| uri.clone()),
                    uri,
                })
            })
            .collect();
        ModelGroundingMetadata {
            rendered_content: metadata
                .search_entry_point
                .and_then(|entry| entry.rendered_content),
            sources,
            search_queries: metadata.web_search_queries,
        }
    }
}
