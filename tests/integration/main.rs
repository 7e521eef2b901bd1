//! Integration tests with mock HTTP server

mod completion;
mod mock_server;
mod pro_mode;
mod timeouts;
