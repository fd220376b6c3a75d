mod board_client;

pub use board_client::BoardClient;
