//! Metric names and descriptions

use metrics::describe_counter;

/// Emails accepted by the transport, labelled by `kind`
pub const EMAILS_SENT_TOTAL: &str = "mailer_emails_sent_total";

/// Emails that failed, labelled by `kind` and `stage` (compose, render, transport)
pub const EMAILS_FAILED_TOTAL: &str = "mailer_emails_failed_total";

/// Register metric descriptions with whatever recorder is installed.
pub fn describe_metrics() {
    describe_counter!(EMAILS_SENT_TOTAL, "Total number of emails sent");
    describe_counter!(
        EMAILS_FAILED_TOTAL,
        "Total number of emails that failed to compose or send"
    );
}
