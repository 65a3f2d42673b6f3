//! Request and response shapes exchanged with the NotebookLM client.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notebook {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFulltext {
    pub title: String,
    pub content: String,
}

/// Payload of a new source. Exactly one kind per request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NewSource {
    Url { url: String },
    Text { title: String, content: String },
    /// Local file already read by the caller; sent as multipart, never as JSON.
    #[serde(skip_serializing)]
    File { file_name: String, data: Vec<u8> },
}

/// A passage of a source that backs part of a chat answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    #[serde(default)]
    pub citation_number: Option<u32>,
    pub source_id: String,
    #[serde(default)]
    pub cited_text: Option<String>,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.citation_number {
            write!(f, "[{}] ", n)?;
        }
        write!(f, "source {}", self.source_id)?;
        if let Some(ref text) = self.cited_text {
            write!(f, ": \"{}\"", text)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    #[serde(default)]
    pub references: Vec<Citation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResearchSource {
    Web,
    Drive,
}

impl ResearchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Drive => "drive",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResearchMode {
    #[default]
    Fast,
    Deep,
}

impl ResearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Deep => "deep",
        }
    }
}

/// A source discovered by the research agent that can be imported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveredSource {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// Research results as the remote service reports them; shape is not stable.
pub type ResearchReport = serde_json::Map<String, Value>;

/// The nine generated artifact kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Audio,
    Video,
    Report,
    Quiz,
    Flashcards,
    SlideDeck,
    Infographic,
    MindMap,
    DataTable,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 9] = [
        Self::Audio,
        Self::Video,
        Self::Report,
        Self::Quiz,
        Self::Flashcards,
        Self::SlideDeck,
        Self::Infographic,
        Self::MindMap,
        Self::DataTable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Report => "report",
            Self::Quiz => "quiz",
            Self::Flashcards => "flashcards",
            Self::SlideDeck => "slide_deck",
            Self::Infographic => "infographic",
            Self::MindMap => "mind_map",
            Self::DataTable => "data_table",
        }
    }

    /// File extension of the downloaded file.
    pub fn extension(&self, format: DownloadFormat) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Video => "mp4",
            Self::Report => "md",
            Self::Quiz | Self::Flashcards => format.extension(),
            Self::SlideDeck => "pdf",
            Self::Infographic => "png",
            Self::MindMap => "json",
            Self::DataTable => "csv",
        }
    }

    /// Observed completion times: minutes for audio/video, seconds for mind maps.
    pub fn default_schedule(&self) -> PollSchedule {
        match self {
            Self::Audio | Self::Video => {
                PollSchedule::new(Duration::from_secs(10), Duration::from_secs(600))
            }
            Self::MindMap => PollSchedule::new(Duration::from_secs(1), Duration::from_secs(60)),
            _ => PollSchedule::new(Duration::from_secs(5), Duration::from_secs(300)),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interval between status queries and the total wait budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl PollSchedule {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DownloadFormat {
    #[default]
    Json,
    Markdown,
    Html,
}

impl DownloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Html => "html",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Html => "html",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    BriefingDoc,
    StudyGuide,
    BlogPost,
    Custom,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BriefingDoc => "briefing_doc",
            Self::StudyGuide => "study_guide",
            Self::BlogPost => "blog_post",
            Self::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    DeepDive,
    Brief,
    Critique,
    Debate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioLength {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuizQuantity {
    Fewer,
    Standard,
    More,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VideoStyle {
    Classic,
    Whiteboard,
    Kawaii,
    Anime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InfographicOrientation {
    Portrait,
    Landscape,
    Square,
}

/// Kind-specific generation options.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationOptions {
    Report {
        format: ReportFormat,
        #[serde(skip_serializing_if = "Option::is_none")]
        custom_prompt: Option<String>,
    },
    Audio {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<AudioFormat>,
        #[serde(skip_serializing_if = "Option::is_none")]
        length: Option<AudioLength>,
    },
    Video {
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<VideoStyle>,
    },
    Quiz {
        #[serde(skip_serializing_if = "Option::is_none")]
        quantity: Option<QuizQuantity>,
        #[serde(skip_serializing_if = "Option::is_none")]
        difficulty: Option<Difficulty>,
    },
    Flashcards {
        #[serde(skip_serializing_if = "Option::is_none")]
        quantity: Option<QuizQuantity>,
        #[serde(skip_serializing_if = "Option::is_none")]
        difficulty: Option<Difficulty>,
    },
    SlideDeck,
    Infographic {
        #[serde(skip_serializing_if = "Option::is_none")]
        orientation: Option<InfographicOrientation>,
    },
    MindMap,
    DataTable,
}

impl GenerationOptions {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Report { .. } => ArtifactKind::Report,
            Self::Audio { .. } => ArtifactKind::Audio,
            Self::Video { .. } => ArtifactKind::Video,
            Self::Quiz { .. } => ArtifactKind::Quiz,
            Self::Flashcards { .. } => ArtifactKind::Flashcards,
            Self::SlideDeck => ArtifactKind::SlideDeck,
            Self::Infographic { .. } => ArtifactKind::Infographic,
            Self::MindMap => ArtifactKind::MindMap,
            Self::DataTable => ArtifactKind::DataTable,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    #[serde(flatten)]
    pub options: GenerationOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl GenerationRequest {
    pub fn new(options: GenerationOptions) -> Self {
        Self {
            options,
            language: None,
            instructions: None,
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn kind(&self) -> ArtifactKind {
        self.options.kind()
    }
}

/// Opaque handle of a started generation job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobHandle {
    pub notebook_id: String,
    pub task_id: String,
    pub kind: ArtifactKind,
}

/// Status reported by the remote service for one poll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    /// Diagnostic text supplied by the remote service, if any.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub artifact: Option<ArtifactRef>,
}

impl JobStatusReport {
    pub fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            message: None,
            artifact: None,
        }
    }

    pub fn running() -> Self {
        Self {
            status: JobStatus::Running,
            ..Self::pending()
        }
    }

    pub fn succeeded(artifact: ArtifactRef) -> Self {
        Self {
            status: JobStatus::Succeeded,
            message: None,
            artifact: Some(artifact),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            message: Some(message.into()),
            artifact: None,
        }
    }
}

/// Pointer to a downloadable generated asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactRef {
    pub id: String,
    pub kind: ArtifactKind,
    #[serde(default)]
    pub title: Option<String>,
    /// Structured outputs (mind maps) come back inline.
    #[serde(default)]
    pub content: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactSummary {
    pub id: String,
    pub kind: ArtifactKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
}
