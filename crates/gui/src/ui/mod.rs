pub mod status_bar;
pub mod word_bank;
