//! The two pipeline agents and their startup smoke test.
//!
//! Neither agent carries pipeline logic yet: on start each one checks its
//! configuration, sends a greeting to its model and logs the reply.

mod bootstrap;
mod gemini;

pub use bootstrap::{preview, run_agent, smoke_test, SMOKE_TEST_PROMPT};
pub use gemini::{GeminiClient, GenerateContentResponse};

/// Which side of the agent-to-agent contract a process plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    /// Parses documents and produces `StoreKnowledgeRequest`s
    Ingestion,
    /// Validates and stores requests, replies with `StoreKnowledgeResponse`s
    Database,
}

impl AgentKind {
    /// Agent name as registered with the model runtime
    pub fn name(&self) -> &'static str {
        match self {
            AgentKind::Ingestion => "ingestion_agent",
            AgentKind::Database => "database_agent",
        }
    }

    /// Human-readable name for log lines
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::Ingestion => "Ingestion Agent",
            AgentKind::Database => "Database Agent",
        }
    }

    pub fn app_name(&self) -> String {
        format!("{}_app", self.name())
    }

    /// Key under `[agents]` in config.toml
    pub fn config_key(&self) -> &'static str {
        match self {
            AgentKind::Ingestion => "ingestion",
            AgentKind::Database => "database",
        }
    }

    /// Environment variable overriding the model
    pub fn model_env(&self) -> &'static str {
        match self {
            AgentKind::Ingestion => "INGESTION_AGENT_MODEL",
            AgentKind::Database => "DATABASE_AGENT_MODEL",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentKind::Ingestion => {
                "PDF ingestion and agentic chunking agent for the pdf_to_knowledge pipeline."
            }
            AgentKind::Database => {
                "Storage and retrieval agent with MCP for the pdf_to_knowledge pipeline."
            }
        }
    }

    /// System instruction sent with every prompt
    pub fn instruction(&self) -> &'static str {
        match self {
            AgentKind::Ingestion => {
                "You are the Ingestion Agent for the pdf_to_knowledge system.
Your role is to:
1. Parse and process PDF documents
2. Perform semantic segmentation of content
3. Inject global context into chunks
4. Communicate with the Database Agent via A2A protocol

For now, respond to greetings and basic queries about your capabilities."
            }
            AgentKind::Database => {
                "You are the Database Agent for the pdf_to_knowledge system.
Your role is to:
1. Receive knowledge chunks from the Ingestion Agent via A2A protocol
2. Validate incoming data against schemas
3. Store data in Firestore (documents) and Neo4j (graph relationships)
4. Provide retrieval capabilities for stored knowledge

For now, respond to greetings and basic queries about your capabilities."
            }
        }
    }
}
