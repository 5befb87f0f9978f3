pub mod account_writer;
pub mod ledger_writer;
