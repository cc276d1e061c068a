pub mod db;

pub use db::{
    create_db, find_card_by_hash, get_all_cards, insert_card, CardRow, DbPool,
};
