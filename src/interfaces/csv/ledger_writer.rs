use crate::domain::payout::PayoutEntry;
use crate::error::Result;
use std::io::Write;

/// Writes the payout ledger view read by notification and admin tooling.
pub struct PayoutLedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PayoutLedgerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_entries(&mut self, entries: Vec<PayoutEntry>) -> Result<()> {
        self.writer.write_record([
            "id",
            "host",
            "booking",
            "amount",
            "status",
            "eligible_at",
            "processed_at",
            "transfer_ref",
        ])?;
        for entry in entries {
            self.writer.write_record([
                entry.id.to_string(),
                entry.host.to_string(),
                entry.booking.to_string(),
                entry.amount.value().to_string(),
                format!("{:?}", entry.status).to_uppercase(),
                entry.eligible_at.to_rfc3339(),
                entry
                    .processed_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                entry.transfer_ref.unwrap_or_default(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
