//! Cross-field and cross-message conventions that validation does not enforce.
//!
//! Validation stays permissive about these; callers that care can ask for the
//! list of issues and log or act on them.

use super::knowledge::{StoreKnowledgeRequest, StoreKnowledgeResponse};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// `page_start` is after `page_end`
    PageRangeInverted {
        chunk_id: Uuid,
        page_start: u64,
        page_end: u64,
    },
    RequestIdMismatch {
        expected: Uuid,
        found: Uuid,
    },
    JobIdMismatch {
        expected: String,
        found: String,
    },
    /// `chunks_received` differs from the request's chunk count
    ReceivedCountMismatch {
        expected: u64,
        found: u64,
    },
    /// Not one result per received chunk
    ResultCountMismatch {
        expected: u64,
        found: usize,
    },
    /// `chunks_stored` differs from the number of successful results
    StoredCountMismatch {
        successful_results: u64,
        chunks_stored: u64,
    },
    /// Result for a chunk id the request never carried
    UnknownChunk {
        chunk_id: Uuid,
    },
    /// Failed result with no error text
    FailureWithoutError {
        chunk_id: Uuid,
    },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::PageRangeInverted {
                chunk_id,
                page_start,
                page_end,
            } => write!(
                f,
                "chunk {}: page_start {} is after page_end {}",
                chunk_id, page_start, page_end
            ),
            ConsistencyIssue::RequestIdMismatch { expected, found } => {
                write!(f, "request_id {} does not echo request {}", found, expected)
            }
            ConsistencyIssue::JobIdMismatch { expected, found } => {
                write!(f, "job_id {} does not echo job {}", found, expected)
            }
            ConsistencyIssue::ReceivedCountMismatch { expected, found } => write!(
                f,
                "chunks_received is {} but the request carried {} chunks",
                found, expected
            ),
            ConsistencyIssue::ResultCountMismatch { expected, found } => {
                write!(f, "{} results for {} received chunks", found, expected)
            }
            ConsistencyIssue::StoredCountMismatch {
                successful_results,
                chunks_stored,
            } => write!(
                f,
                "chunks_stored is {} but {} results report success",
                chunks_stored, successful_results
            ),
            ConsistencyIssue::UnknownChunk { chunk_id } => {
                write!(f, "result for chunk {} which is not part of the request", chunk_id)
            }
            ConsistencyIssue::FailureWithoutError { chunk_id } => {
                write!(f, "chunk {} failed without an error message", chunk_id)
            }
        }
    }
}

impl StoreKnowledgeRequest {
    /// Chunks whose page range runs backwards
    pub fn consistency_issues(&self) -> Vec<ConsistencyIssue> {
        self.chunks()
            .iter()
            .filter_map(|chunk| {
                let meta = chunk.metadata();
                match (meta.page_start(), meta.page_end()) {
                    (Some(page_start), Some(page_end)) if page_start > page_end => {
                        Some(ConsistencyIssue::PageRangeInverted {
                            chunk_id: chunk.id(),
                            page_start,
                            page_end,
                        })
                    }
                    _ => None,
                }
            })
            .collect()
    }
}

impl StoreKnowledgeResponse {
    /// Check this reply against the request it answers
    pub fn consistency_issues(&self, request: &StoreKnowledgeRequest) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();

        if self.request_id() != request.request_id() {
            issues.push(ConsistencyIssue::RequestIdMismatch {
                expected: request.request_id(),
                found: self.request_id(),
            });
        }
        if self.job_id() != request.job_id() {
            issues.push(ConsistencyIssue::JobIdMismatch {
                expected: request.job_id().to_string(),
                found: self.job_id().to_string(),
            });
        }

        let sent = request.chunk_count() as u64;
        if self.chunks_received() != sent {
            issues.push(ConsistencyIssue::ReceivedCountMismatch {
                expected: sent,
                found: self.chunks_received(),
            });
        }
        if self.results().len() as u64 != self.chunks_received() {
            issues.push(ConsistencyIssue::ResultCountMismatch {
                expected: self.chunks_received(),
                found: self.results().len(),
            });
        }

        if !self.results().is_empty() {
            let successful = self.results().iter().filter(|r| r.success()).count() as u64;
            if successful != self.chunks_stored() {
                issues.push(ConsistencyIssue::StoredCountMismatch {
                    successful_results: successful,
                    chunks_stored: self.chunks_stored(),
                });
            }
        }

        let known: HashSet<Uuid> = request.chunks().iter().map(|c| c.id()).collect();
        for result in self.results() {
            if !known.contains(&result.chunk_id()) {
                issues.push(ConsistencyIssue::UnknownChunk {
                    chunk_id: result.chunk_id(),
                });
            }
            if !result.success() && result.error().is_none() {
                issues.push(ConsistencyIssue::FailureWithoutError {
                    chunk_id: result.chunk_id(),
                });
            }
        }

        issues
    }
}
