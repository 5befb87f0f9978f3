use crate::domain::account::HostAccount;
use crate::error::Result;
use std::io::Write;

/// Writes the host-account summary consumed by admin reporting.
pub struct HostAccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> HostAccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, accounts: Vec<HostAccount>) -> Result<()> {
        self.writer.write_record([
            "host",
            "pending_balance",
            "current_balance",
            "total_earnings",
            "payouts_enabled",
            "payouts_completed",
            "payouts_failed",
        ])?;
        for account in accounts {
            self.writer.write_record([
                account.host.to_string(),
                account.pending_balance.to_string(),
                account.current_balance.to_string(),
                account.total_earnings.to_string(),
                account.payouts_enabled.to_string(),
                account.payouts_completed.to_string(),
                account.payouts_failed.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
