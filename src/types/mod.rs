// Public modules
pub mod message;
pub mod query_request;
pub mod query_response;
pub mod query_result;
pub mod retrieved_document;
pub mod session_status;

// Re-exports
pub use message::{Message, Sender};
pub use query_request::QueryRequest;
pub use query_response::QueryResponse;
pub use query_result::QueryResult;
pub use retrieved_document::RetrievedDocument;
pub use session_status::SessionStatus;
