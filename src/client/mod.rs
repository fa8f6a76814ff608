//! Client side of the notes API: transport, session and note state.

pub mod controller;
pub mod gateway;
pub mod session;

pub use controller::{
    ArchiveRequest, ArchiveResponse, NoteController, SearchRequest, SearchResponse,
};
pub use gateway::{ApiGateway, ClientError};
pub use session::{Session, SessionStore};
