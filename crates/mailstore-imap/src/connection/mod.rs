//! IMAP connections: transport, framing, the command executor and the
//! connector that produces authenticated sessions.

mod cache;
mod client;
mod config;
mod connector;
mod framed;
mod responses;
mod stream;

pub use cache::{FolderCache, FolderInfo};
pub use client::{Connection, Fetched};
pub use config::{
    AuthOptions, ConnectConfig, ConnectConfigBuilder, Credential, Endpoint, Security,
};
pub use connector::{Connector, ImapConnector};
pub use framed::FramedStream;
pub use responses::{Completion, Responses};
pub use stream::{ImapStream, dial, tls_connector};
