mod commands;
pub(crate) use commands::*;


mod download_sweeper;
pub(crate) use download_sweeper::*;

mod menu;
pub(crate) use menu::*;

mod telegram_client;
pub(crate) use telegram_client::*;
