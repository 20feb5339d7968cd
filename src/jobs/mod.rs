pub mod protocol_sync;
