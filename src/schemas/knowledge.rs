//! Knowledge payloads exchanged between the ingestion and database agents.
//!
//! Every type here is a value object: it is either built through its
//! constructor/builder or validated from untyped JSON, and in both cases the
//! field constraints are enforced before a value exists. Nothing is mutable
//! afterwards.

use super::checks::{self, ObjectReader, Validator};
use super::errors::{ErrorType, SchemaValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const DESCRIPTION_MIN_CHARS: usize = 10;

/// Overall outcome of a storage operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStatus {
    Success,
    /// Some chunks failed
    Partial,
    Failed,
    ValidationError,
}

impl ProcessingStatus {
    pub const ALL: [ProcessingStatus; 4] = [
        ProcessingStatus::Success,
        ProcessingStatus::Partial,
        ProcessingStatus::Failed,
        ProcessingStatus::ValidationError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Success => "success",
            ProcessingStatus::Partial => "partial",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::ValidationError => "validation_error",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProcessingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown processing status: {}", s))
    }
}

/// Description of a visual element (chart, diagram, table, image, formula)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualDescription {
    visual_id: String,
    visual_type: String,
    description: String,
    page_number: Option<u64>,
}

impl VisualDescription {
    /// `description` needs at least 10 characters; `page_number` starts at 1
    pub fn new(
        visual_id: impl Into<String>,
        visual_type: impl Into<String>,
        description: impl Into<String>,
        page_number: Option<u64>,
    ) -> Result<Self, SchemaValidationError> {
        let visual = Self {
            visual_id: visual_id.into(),
            visual_type: visual_type.into(),
            description: description.into(),
            page_number,
        };

        let mut v = Validator::new();
        v.nested("description", |v| {
            v.check_min_chars(&visual.description, DESCRIPTION_MIN_CHARS)
        });
        if let Some(page) = visual.page_number {
            v.nested("page_number", |v| v.check_min_int(i128::from(page), 1));
        }
        v.finish(Some(visual))
            .map_err(|errors| SchemaValidationError::from_field_errors("VisualDescription validation failed", errors))
    }

    /// Unique only within the owning chunk
    pub fn visual_id(&self) -> &str {
        &self.visual_id
    }

    pub fn visual_type(&self) -> &str {
        &self.visual_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn page_number(&self) -> Option<u64> {
        self.page_number
    }

    pub(crate) fn collect(v: &mut Validator, value: &Value) -> Option<Self> {
        let mut obj = ObjectReader::open(v, value, "VisualDescription")?;
        let visual_id = obj.required(v, "visual_id", checks::string);
        let visual_type = obj.required(v, "visual_type", checks::string);
        let description = obj.required(v, "description", |v, x| {
            checks::string(v, x).filter(|s| v.check_min_chars(s, DESCRIPTION_MIN_CHARS))
        });
        let page_number = obj.optional(v, "page_number", checks::positive_u64);
        obj.forbid_extra(v);

        Some(Self {
            visual_id: visual_id?,
            visual_type: visual_type?,
            description: description?,
            page_number: page_number?,
        })
    }
}

/// Provenance and position of one chunk.
///
/// Open shape: keys that are not declared here are kept in [`extra`](Self::extra)
/// and written back out when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMetadata {
    source_document: String,
    chapter: Option<String>,
    section: Option<String>,
    page_start: Option<u64>,
    page_end: Option<u64>,
    chunk_index: u64,
    total_chunks: Option<u64>,
    keywords: Vec<String>,
    tone: Option<String>,
    trace_id: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ChunkMetadata {
    const FIELDS: [&'static str; 10] = [
        "source_document",
        "chapter",
        "section",
        "page_start",
        "page_end",
        "chunk_index",
        "total_chunks",
        "keywords",
        "tone",
        "trace_id",
    ];

    pub fn builder(source_document: impl Into<String>, chunk_index: u64) -> ChunkMetadataBuilder {
        ChunkMetadataBuilder {
            inner: ChunkMetadata {
                source_document: source_document.into(),
                chapter: None,
                section: None,
                page_start: None,
                page_end: None,
                chunk_index,
                total_chunks: None,
                keywords: Vec::new(),
                tone: None,
                trace_id: None,
                extra: Map::new(),
            },
        }
    }

    pub fn source_document(&self) -> &str {
        &self.source_document
    }

    pub fn chapter(&self) -> Option<&str> {
        self.chapter.as_deref()
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn page_start(&self) -> Option<u64> {
        self.page_start
    }

    pub fn page_end(&self) -> Option<u64> {
        self.page_end
    }

    pub fn chunk_index(&self) -> u64 {
        self.chunk_index
    }

    pub fn total_chunks(&self) -> Option<u64> {
        self.total_chunks
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn tone(&self) -> Option<&str> {
        self.tone.as_deref()
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Caller-supplied attributes outside the declared field set
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub(crate) fn collect(v: &mut Validator, value: &Value) -> Option<Self> {
        let mut obj = ObjectReader::open(v, value, "ChunkMetadata")?;
        let source_document = obj.required(v, "source_document", checks::string);
        let chapter = obj.optional(v, "chapter", checks::string);
        let section = obj.optional(v, "section", checks::string);
        let page_start = obj.optional(v, "page_start", checks::positive_u64);
        let page_end = obj.optional(v, "page_end", checks::positive_u64);
        let chunk_index = obj.required(v, "chunk_index", checks::non_negative_u64);
        let total_chunks = obj.optional(v, "total_chunks", checks::positive_u64);
        let keywords = obj.defaulted(v, "keywords", |v, x| checks::list(v, x, checks::string));
        let tone = obj.optional(v, "tone", checks::string);
        let trace_id = obj.optional(v, "trace_id", checks::string);
        let extra = obj.into_extra();

        Some(Self {
            source_document: source_document?,
            chapter: chapter?,
            section: section?,
            page_start: page_start?,
            page_end: page_end?,
            chunk_index: chunk_index?,
            total_chunks: total_chunks?,
            keywords: keywords?.unwrap_or_default(),
            tone: tone?,
            trace_id: trace_id?,
            extra,
        })
    }
}

pub struct ChunkMetadataBuilder {
    inner: ChunkMetadata,
}

impl ChunkMetadataBuilder {
    pub fn chapter(mut self, chapter: impl Into<String>) -> Self {
        self.inner.chapter = Some(chapter.into());
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.inner.section = Some(section.into());
        self
    }

    pub fn page_start(mut self, page: u64) -> Self {
        self.inner.page_start = Some(page);
        self
    }

    pub fn page_end(mut self, page: u64) -> Self {
        self.inner.page_end = Some(page);
        self
    }

    pub fn total_chunks(mut self, total: u64) -> Self {
        self.inner.total_chunks = Some(total);
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.inner.keywords.push(keyword.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn tone(mut self, tone: impl Into<String>) -> Self {
        self.inner.tone = Some(tone.into());
        self
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.inner.trace_id = Some(trace_id.into());
        self
    }

    /// Attach an attribute outside the declared field set
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.extra.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<ChunkMetadata, SchemaValidationError> {
        let meta = self.inner;
        let mut v = Validator::new();
        for (key, page) in [
            ("page_start", meta.page_start),
            ("page_end", meta.page_end),
            ("total_chunks", meta.total_chunks),
        ] {
            if let Some(n) = page {
                v.nested(key, |v| v.check_min_int(i128::from(n), 1));
            }
        }
        for (key, value) in &meta.extra {
            if ChunkMetadata::FIELDS.contains(&key.as_str()) {
                v.nested(key.as_str(), |v| {
                    v.report(
                        ErrorType::ValueError,
                        "Value error, extra attribute shadows a declared field",
                        Some(value),
                    )
                });
            }
        }
        v.finish(Some(meta))
            .map_err(|errors| SchemaValidationError::from_field_errors("ChunkMetadata validation failed", errors))
    }
}

/// The atomic unit of knowledge transferred between agents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeChunk {
    id: Uuid,
    text: String,
    global_context: String,
    context_injection: Option<String>,
    visuals: Vec<VisualDescription>,
    metadata: ChunkMetadata,
    created_at: DateTime<Utc>,
}

impl KnowledgeChunk {
    pub fn builder(
        text: impl Into<String>,
        global_context: impl Into<String>,
        metadata: ChunkMetadata,
    ) -> KnowledgeChunkBuilder {
        KnowledgeChunkBuilder {
            id: None,
            text: text.into(),
            global_context: global_context.into(),
            context_injection: None,
            visuals: Vec::new(),
            metadata,
            created_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Document-level summary injected so the chunk reads on its own
    pub fn global_context(&self) -> &str {
        &self.global_context
    }

    pub fn context_injection(&self) -> Option<&str> {
        self.context_injection.as_deref()
    }

    pub fn visuals(&self) -> &[VisualDescription] {
        &self.visuals
    }

    pub fn metadata(&self) -> &ChunkMetadata {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn check_text(v: &mut Validator, text: &str) -> bool {
        v.check_min_chars(text, 1) && v.check_not_blank(text)
    }

    pub(crate) fn collect(v: &mut Validator, value: &Value) -> Option<Self> {
        let mut obj = ObjectReader::open(v, value, "KnowledgeChunk")?;
        let id = obj.defaulted(v, "id", checks::uuid);
        let text = obj.required(v, "text", |v, x| {
            checks::string(v, x).filter(|s| Self::check_text(v, s))
        });
        let global_context = obj.required(v, "global_context", |v, x| {
            checks::string(v, x).filter(|s| v.check_min_chars(s, 1))
        });
        let context_injection = obj.optional(v, "context_injection", checks::string);
        let visuals = obj.defaulted(v, "visuals", |v, x| {
            checks::list(v, x, VisualDescription::collect)
        });
        let metadata = obj.required(v, "metadata", ChunkMetadata::collect);
        let created_at = obj.defaulted(v, "created_at", checks::timestamp);
        obj.forbid_extra(v);

        Some(Self {
            id: id?.unwrap_or_else(Uuid::new_v4),
            text: text?,
            global_context: global_context?,
            context_injection: context_injection?,
            visuals: visuals?.unwrap_or_default(),
            metadata: metadata?,
            created_at: created_at?.unwrap_or_else(Utc::now),
        })
    }
}

pub struct KnowledgeChunkBuilder {
    id: Option<Uuid>,
    text: String,
    global_context: String,
    context_injection: Option<String>,
    visuals: Vec<VisualDescription>,
    metadata: ChunkMetadata,
    created_at: Option<DateTime<Utc>>,
}

impl KnowledgeChunkBuilder {
    /// Use this id instead of a fresh v4 UUID
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn context_injection(mut self, context: impl Into<String>) -> Self {
        self.context_injection = Some(context.into());
        self
    }

    pub fn visual(mut self, visual: VisualDescription) -> Self {
        self.visuals.push(visual);
        self
    }

    pub fn visuals(mut self, visuals: impl IntoIterator<Item = VisualDescription>) -> Self {
        self.visuals.extend(visuals);
        self
    }

    /// Use this timestamp instead of the build time
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn build(self) -> Result<KnowledgeChunk, SchemaValidationError> {
        let mut v = Validator::new();
        v.nested("text", |v| KnowledgeChunk::check_text(v, &self.text));
        v.nested("global_context", |v| v.check_min_chars(&self.global_context, 1));

        let chunk = KnowledgeChunk {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            text: self.text,
            global_context: self.global_context,
            context_injection: self.context_injection,
            visuals: self.visuals,
            metadata: self.metadata,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        };
        v.finish(Some(chunk))
            .map_err(|errors| SchemaValidationError::from_field_errors("KnowledgeChunk validation failed", errors))
    }
}

/// Batch of chunks sent by the ingestion agent to the database agent.
///
/// One request carries part (or all) of one ingestion job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreKnowledgeRequest {
    request_id: Uuid,
    job_id: String,
    chunks: Vec<KnowledgeChunk>,
    document_global_context: String,
    is_final_batch: bool,
    trace_id: Option<String>,
}

impl StoreKnowledgeRequest {
    pub fn builder(
        job_id: impl Into<String>,
        document_global_context: impl Into<String>,
    ) -> StoreKnowledgeRequestBuilder {
        StoreKnowledgeRequestBuilder {
            request_id: None,
            job_id: job_id.into(),
            chunks: Vec::new(),
            document_global_context: document_global_context.into(),
            is_final_batch: false,
            trace_id: None,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }

    pub fn document_global_context(&self) -> &str {
        &self.document_global_context
    }

    /// True for the last batch of a job
    pub fn is_final_batch(&self) -> bool {
        self.is_final_batch
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn collect(v: &mut Validator, value: &Value) -> Option<Self> {
        let mut obj = ObjectReader::open(v, value, "StoreKnowledgeRequest")?;
        let request_id = obj.defaulted(v, "request_id", checks::uuid);
        let job_id = obj.required(v, "job_id", |v, x| {
            checks::string(v, x).filter(|s| v.check_min_chars(s, 1))
        });
        let chunks = obj.required(v, "chunks", |v, x| {
            checks::list(v, x, KnowledgeChunk::collect).filter(|c| v.check_min_items(c.len(), 1))
        });
        let document_global_context = obj.required(v, "document_global_context", checks::string);
        let is_final_batch = obj.defaulted(v, "is_final_batch", checks::boolean);
        let trace_id = obj.optional(v, "trace_id", checks::string);
        obj.forbid_extra(v);

        Some(Self {
            request_id: request_id?.unwrap_or_else(Uuid::new_v4),
            job_id: job_id?,
            chunks: chunks?,
            document_global_context: document_global_context?,
            is_final_batch: is_final_batch?.unwrap_or(false),
            trace_id: trace_id?,
        })
    }
}

pub struct StoreKnowledgeRequestBuilder {
    request_id: Option<Uuid>,
    job_id: String,
    chunks: Vec<KnowledgeChunk>,
    document_global_context: String,
    is_final_batch: bool,
    trace_id: Option<String>,
}

impl StoreKnowledgeRequestBuilder {
    /// Use this id instead of a fresh v4 UUID
    pub fn request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn chunk(mut self, chunk: KnowledgeChunk) -> Self {
        self.chunks.push(chunk);
        self
    }

    pub fn chunks(mut self, chunks: impl IntoIterator<Item = KnowledgeChunk>) -> Self {
        self.chunks.extend(chunks);
        self
    }

    pub fn final_batch(mut self, is_final_batch: bool) -> Self {
        self.is_final_batch = is_final_batch;
        self
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn build(self) -> Result<StoreKnowledgeRequest, SchemaValidationError> {
        let mut v = Validator::new();
        v.nested("job_id", |v| v.check_min_chars(&self.job_id, 1));
        v.nested("chunks", |v| v.check_min_items(self.chunks.len(), 1));

        let request = StoreKnowledgeRequest {
            request_id: self.request_id.unwrap_or_else(Uuid::new_v4),
            job_id: self.job_id,
            chunks: self.chunks,
            document_global_context: self.document_global_context,
            is_final_batch: self.is_final_batch,
            trace_id: self.trace_id,
        };
        v.finish(Some(request))
            .map_err(|errors| SchemaValidationError::from_field_errors("StoreKnowledgeRequest validation failed", errors))
    }
}

/// Outcome of storing one chunk.
///
/// Unknown keys in inbound data are ignored rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredChunkResult {
    chunk_id: Uuid,
    firestore_id: Option<String>,
    neo4j_node_id: Option<String>,
    success: bool,
    error: Option<String>,
}

impl StoredChunkResult {
    /// A chunk that was stored; attach backend ids with the `with_*` methods
    pub fn stored(chunk_id: Uuid) -> Self {
        Self {
            chunk_id,
            firestore_id: None,
            neo4j_node_id: None,
            success: true,
            error: None,
        }
    }

    pub fn failed(chunk_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            chunk_id,
            firestore_id: None,
            neo4j_node_id: None,
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn with_firestore_id(mut self, id: impl Into<String>) -> Self {
        self.firestore_id = Some(id.into());
        self
    }

    pub fn with_neo4j_node_id(mut self, id: impl Into<String>) -> Self {
        self.neo4j_node_id = Some(id.into());
        self
    }

    pub fn chunk_id(&self) -> Uuid {
        self.chunk_id
    }

    pub fn firestore_id(&self) -> Option<&str> {
        self.firestore_id.as_deref()
    }

    pub fn neo4j_node_id(&self) -> Option<&str> {
        self.neo4j_node_id.as_deref()
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn collect(v: &mut Validator, value: &Value) -> Option<Self> {
        let mut obj = ObjectReader::open(v, value, "StoredChunkResult")?;
        let chunk_id = obj.required(v, "chunk_id", checks::uuid);
        let firestore_id = obj.optional(v, "firestore_id", checks::string);
        let neo4j_node_id = obj.optional(v, "neo4j_node_id", checks::string);
        let success = obj.required(v, "success", checks::boolean);
        let error = obj.optional(v, "error", checks::string);

        Some(Self {
            chunk_id: chunk_id?,
            firestore_id: firestore_id?,
            neo4j_node_id: neo4j_node_id?,
            success: success?,
            error: error?,
        })
    }
}

/// Reply from the database agent for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreKnowledgeResponse {
    request_id: Uuid,
    job_id: String,
    status: ProcessingStatus,
    chunks_received: u64,
    chunks_stored: u64,
    results: Vec<StoredChunkResult>,
    error_message: Option<String>,
    trace_id: Option<String>,
    processed_at: DateTime<Utc>,
}

impl StoreKnowledgeResponse {
    pub fn builder(
        request_id: Uuid,
        job_id: impl Into<String>,
        status: ProcessingStatus,
        chunks_received: u64,
        chunks_stored: u64,
    ) -> StoreKnowledgeResponseBuilder {
        StoreKnowledgeResponseBuilder {
            inner: StoreKnowledgeResponse {
                request_id,
                job_id: job_id.into(),
                status,
                chunks_received,
                chunks_stored,
                results: Vec::new(),
                error_message: None,
                trace_id: None,
                processed_at: Utc::now(),
            },
        }
    }

    /// Reply for `request` derived from its per-chunk results.
    ///
    /// `success` when every chunk was stored, `failed` when none was,
    /// `partial` otherwise. A failed reply carries the chunk errors joined
    /// with `"; "` as its error message.
    pub fn from_results(request: &StoreKnowledgeRequest, results: Vec<StoredChunkResult>) -> Self {
        let received = request.chunk_count() as u64;
        let stored = results.iter().filter(|r| r.success()).count() as u64;

        let status = if stored == 0 {
            ProcessingStatus::Failed
        } else if stored < received {
            ProcessingStatus::Partial
        } else {
            ProcessingStatus::Success
        };

        let error_message = (status == ProcessingStatus::Failed).then(|| {
            let errors: Vec<&str> = results.iter().filter_map(|r| r.error()).collect();
            if errors.is_empty() {
                "no chunks were stored".to_string()
            } else {
                errors.join("; ")
            }
        });

        Self {
            request_id: request.request_id(),
            job_id: request.job_id().to_string(),
            status,
            chunks_received: received,
            chunks_stored: stored,
            results,
            error_message,
            trace_id: request.trace_id().map(String::from),
            processed_at: Utc::now(),
        }
    }

    /// Reply for a request that never passed validation
    pub fn validation_failed(
        request_id: Uuid,
        job_id: impl Into<String>,
        error: &SchemaValidationError,
    ) -> Self {
        Self::builder(request_id, job_id, ProcessingStatus::ValidationError, 0, 0)
            .error_message(error.message())
            .build()
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn chunks_received(&self) -> u64 {
        self.chunks_received
    }

    pub fn chunks_stored(&self) -> u64 {
        self.chunks_stored
    }

    pub fn results(&self) -> &[StoredChunkResult] {
        &self.results
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn processed_at(&self) -> DateTime<Utc> {
        self.processed_at
    }

    /// `chunks_stored / chunks_received`, or `0.0` when nothing was received
    pub fn success_rate(&self) -> f64 {
        if self.chunks_received == 0 {
            return 0.0;
        }
        self.chunks_stored as f64 / self.chunks_received as f64
    }

    pub(crate) fn collect(v: &mut Validator, value: &Value) -> Option<Self> {
        let mut obj = ObjectReader::open(v, value, "StoreKnowledgeResponse")?;
        let request_id = obj.required(v, "request_id", checks::uuid);
        let job_id = obj.required(v, "job_id", checks::string);
        let status = obj.required(v, "status", checks::status);
        let chunks_received = obj.required(v, "chunks_received", checks::non_negative_u64);
        let chunks_stored = obj.required(v, "chunks_stored", checks::non_negative_u64);
        let results = obj.defaulted(v, "results", |v, x| {
            checks::list(v, x, StoredChunkResult::collect)
        });
        let error_message = obj.optional(v, "error_message", checks::string);
        let trace_id = obj.optional(v, "trace_id", checks::string);
        let processed_at = obj.defaulted(v, "processed_at", checks::timestamp);
        obj.forbid_extra(v);

        Some(Self {
            request_id: request_id?,
            job_id: job_id?,
            status: status?,
            chunks_received: chunks_received?,
            chunks_stored: chunks_stored?,
            results: results?.unwrap_or_default(),
            error_message: error_message?,
            trace_id: trace_id?,
            processed_at: processed_at?.unwrap_or_else(Utc::now),
        })
    }
}

pub struct StoreKnowledgeResponseBuilder {
    inner: StoreKnowledgeResponse,
}

impl StoreKnowledgeResponseBuilder {
    pub fn result(mut self, result: StoredChunkResult) -> Self {
        self.inner.results.push(result);
        self
    }

    pub fn results(mut self, results: impl IntoIterator<Item = StoredChunkResult>) -> Self {
        self.inner.results.extend(results);
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.inner.error_message = Some(message.into());
        self
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.inner.trace_id = Some(trace_id.into());
        self
    }

    /// Use this timestamp instead of the builder's creation time
    pub fn processed_at(mut self, processed_at: DateTime<Utc>) -> Self {
        self.inner.processed_at = processed_at;
        self
    }

    /// Every field is already well-typed, so building cannot fail
    pub fn build(self) -> StoreKnowledgeResponse {
        self.inner
    }
}

/// `TryFrom<Value>` and validating `Deserialize` for each contract type
macro_rules! validated_from_json {
    ($($ty:ident),+ $(,)?) => {$(
        impl TryFrom<Value> for $ty {
            type Error = SchemaValidationError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                checks::run(&value, $ty::collect).map_err(|errors| {
                    SchemaValidationError::from_field_errors(
                        concat!(stringify!($ty), " validation failed"),
                        errors,
                    )
                })
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Value::deserialize(deserializer)?;
                $ty::try_from(value).map_err(serde::de::Error::custom)
            }
        }
    )+};
}

validated_from_json!(
    VisualDescription,
    ChunkMetadata,
    KnowledgeChunk,
    StoreKnowledgeRequest,
    StoredChunkResult,
    StoreKnowledgeResponse,
);
