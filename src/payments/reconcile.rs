//! The reconciliation state machine and its outer boundary.
//!
//! `process_notification` / `process_invalid_notification` are the only
//! entry points; the webhook handler calls them directly and dispatches the
//! returned emails. Nothing in here fails outward: every signaled condition
//! and every unclassified error becomes an operator warning email, because
//! the gateway callback must always be answered with success.

use rusqlite::Connection;

use crate::config::NotifySettings;
use crate::db::queries;
use crate::email::OutboundEmail;
use crate::models::{PaymentNotification, PaymentStatus};
use crate::payments::{resolver, ReconcileError, ResolvedPayment};

/// Process a valid (upstream-verified) payment notification.
///
/// Returns the emails to dispatch; the database mutations have already been
/// applied when this returns.
pub fn process_notification(
    conn: &Connection,
    ipn: &PaymentNotification,
    notify: &NotifySettings,
) -> Vec<OutboundEmail> {
    let mut emails = Vec::new();

    let resolved = match resolver::resolve(conn, ipn) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!(
                "PaypalTransactionError: unknown object for payment (txn_id: {}, error: {})",
                ipn.txn_id,
                e
            );
            emails.push(OutboundEmail::new(
                "WARNING! Error processing PayPal IPN",
                format!(
                    "Valid Payment Notification received from PayPal but an error occurred \
                     during processing.\n\nTransaction id {}\n\nThe flag info was \"{}\"\n\n\
                     Error raised: {}",
                    ipn.txn_id, ipn.flag_info, e
                ),
                vec![notify.support_email.clone()],
            ));
            return emails;
        }
    };

    if let Err(e) = apply(conn, ipn, &resolved, notify, &mut emails) {
        // The single top-level condition handler: report and suppress.
        tracing::warn!(
            "Problem processing payment for order {}; invoice_id {:?}, transaction id: {}. \
             Exception: {}",
            resolved.order.id,
            ipn.invoice,
            ipn.txn_id,
            e
        );
        emails.push(OutboundEmail::new(
            format!(
                "{} There was some problem processing payment for order id {}",
                notify.subject_prefix, resolved.order.id
            ),
            format!(
                "Please check your order and paypal records for invoice # {}, paypal \
                 transaction id {}.\n\nThe exception raised was \"{}\"",
                ipn.invoice.as_deref().unwrap_or(""),
                ipn.txn_id,
                e
            ),
            vec![notify.support_email.clone()],
        ));
    }

    emails
}

/// Apply the state transition for one resolved payment, queueing
/// confirmation emails as it goes.
///
/// Conditions bubble up as `ReconcileError` for the caller to report; any
/// emails queued before the condition stay queued (they describe mutations
/// that did happen).
fn apply(
    conn: &Connection,
    ipn: &PaymentNotification,
    resolved: &ResolvedPayment,
    notify: &NotifySettings,
    emails: &mut Vec<OutboundEmail>,
) -> Result<(), ReconcileError> {
    let order = &resolved.order;
    let user = &resolved.user;
    let trans = &resolved.transaction;

    match ipn.status() {
        PaymentStatus::Completed => {
            let receiver = ipn.receiver_email.as_deref().unwrap_or("");
            if order.paypal_email != receiver {
                let flag_info = format!("Invalid receiver_email ({})", receiver);
                queries::set_notification_flag(conn, ipn.id, &flag_info)?;
                return Err(ReconcileError::ReceiverMismatch(receiver.to_string()));
            }

            queries::set_order_paid(conn, order.id, true)?;

            // Stamp the gateway transaction id only AFTER the order is
            // marked paid. If the user re-requests the payment page in
            // between, the re-render sees "already paid" and skips the
            // button; the other order would re-render it, see a record with
            // a txn_id already set, and mint a second invoice PayPal would
            // accept as a second payment.
            queries::set_transaction_txn_id(conn, trans.id, &ipn.txn_id)?;

            queries::log_activity(
                conn,
                &format!(
                    "Order id {} for user {} paid by PayPal; paypal transaction id {} \
                     (paypal email {})",
                    order.id, user.username, ipn.txn_id, order.paypal_email
                ),
            )?;

            let subject = format!(
                "{} Payment processed for order id {}",
                notify.subject_prefix, order.id
            );
            let body = format!(
                "Payment processed for order id {}.\n\nUser: {}\nInvoice id: {}\n\
                 PayPal transaction id: {}\nPayPal email: {}",
                order.id,
                user.full_name(),
                trans.invoice_id.as_deref().unwrap_or(""),
                ipn.txn_id,
                order.paypal_email
            );
            if notify.send_all_studio_emails {
                emails.push(OutboundEmail::new(
                    subject.clone(),
                    body.clone(),
                    vec![notify.studio_email.clone()],
                ));
            }
            emails.push(OutboundEmail::new(subject, body, vec![user.email.clone()]));

            if let Some(code) = resolved.voucher_code.as_deref() {
                let voucher = queries::get_voucher_by_code(conn, code)?.ok_or_else(|| {
                    crate::error::AppError::NotFound(format!(
                        "Voucher with code {} does not exist",
                        code
                    ))
                })?;
                queries::add_voucher_user(conn, voucher.id, user.id)?;
                queries::set_transaction_voucher(conn, trans.id, code)?;
                queries::log_activity(
                    conn,
                    &format!(
                        "Voucher code {} used for order id {} by user {}",
                        code, order.id, user.username
                    ),
                )?;
            }

            // PayPal sometimes omits the invoice number from the IPN;
            // everything still matches up, but flag it for a manual check.
            if ipn.invoice.as_deref().unwrap_or("").is_empty() {
                if let Some(invoice_id) = trans.invoice_id.as_deref() {
                    queries::set_notification_invoice(conn, ipn.id, invoice_id)?;
                    emails.push(OutboundEmail::new(
                        format!(
                            "{} No invoice number on paypal ipn for order id {}",
                            notify.subject_prefix, order.id
                        ),
                        format!(
                            "Please check order and paypal records for paypal transaction \
                             id {}.  No invoice number on paypal IPN.  Invoice number has \
                             been set to {}.",
                            ipn.txn_id, invoice_id
                        ),
                        vec![notify.support_email.clone()],
                    ));
                }
            }
        }

        PaymentStatus::Refunded => {
            // Accepted from any prior state, deliberately: PayPal sends
            // refund notices for payments that were never tracked locally.
            queries::set_order_paid(conn, order.id, false)?;

            queries::log_activity(
                conn,
                &format!(
                    "Order id {} for user {} has been refunded from paypal; paypal \
                     transaction id {}, invoice id {}",
                    order.id,
                    user.username,
                    ipn.txn_id,
                    trans.invoice_id.as_deref().unwrap_or("")
                ),
            )?;

            // Studio and support only; the payer already gets an automated
            // notice from PayPal.
            emails.push(OutboundEmail::new(
                format!(
                    "{} Payment refund processed for order id {}",
                    notify.subject_prefix, order.id
                ),
                format!(
                    "Payment refund processed for order id {}.\n\nUser: {}\nInvoice id: {}\n\
                     PayPal transaction id: {}\nPayPal email: {}",
                    order.id,
                    user.full_name(),
                    trans.invoice_id.as_deref().unwrap_or(""),
                    ipn.txn_id,
                    order.paypal_email
                ),
                vec![notify.studio_email.clone(), notify.support_email.clone()],
            ));
        }

        PaymentStatus::Pending => {
            queries::log_activity(
                conn,
                &format!(
                    "PayPal payment returned with status PENDING for order {}; ipn obj id {} \
                     (txn id {})",
                    order.id, ipn.id, ipn.txn_id
                ),
            )?;
            return Err(ReconcileError::PendingPayment {
                order_id: order.id,
                notification_id: ipn.id,
                txn_id: ipn.txn_id.clone(),
            });
        }

        PaymentStatus::Other(status) => {
            let status = status.to_uppercase();
            queries::log_activity(
                conn,
                &format!(
                    "Unexpected payment status {} for order {}; ipn obj id {} (txn id {})",
                    status, order.id, ipn.id, ipn.txn_id
                ),
            )?;
            return Err(ReconcileError::UnexpectedStatus {
                status,
                order_id: order.id,
                notification_id: ipn.id,
                txn_id: ipn.txn_id.clone(),
            });
        }
    }

    Ok(())
}

/// Process a notification the upstream gateway integration itself flagged
/// as invalid (failed postback, duplicate txn_id, malformed form).
///
/// Only ever warns; never mutates order state and never raises past this
/// boundary.
pub fn process_invalid_notification(
    conn: &Connection,
    ipn: &PaymentNotification,
    notify: &NotifySettings,
) -> Vec<OutboundEmail> {
    match resolver::resolve(conn, ipn) {
        Err(e) => {
            tracing::error!(
                "PaypalTransactionError: unknown object for payment (transaction_id: {}, error: {})",
                ipn.txn_id,
                e
            );
            vec![OutboundEmail::new(
                "WARNING! Error processing Invalid Payment Notification from PayPal",
                format!(
                    "PayPal sent an invalid transaction notification while attempting to \
                     process payment.\n\nThe flag info was \"{}\"\n\nAn additional error \
                     was raised: {}",
                    ipn.flag_info, e
                ),
                vec![notify.support_email.clone()],
            )]
        }
        Ok(resolved) => {
            tracing::warn!(
                "Invalid Payment Notification received from PayPal for order id {}",
                resolved.order.id
            );
            vec![OutboundEmail::new(
                "WARNING! Invalid Payment Notification received from PayPal",
                format!(
                    "PayPal sent an invalid transaction notification while attempting to \
                     process payment for order id {}.\n\nThe flag info was \"{}\"",
                    resolved.order.id, ipn.flag_info
                ),
                vec![notify.support_email.clone()],
            )]
        }
    }
}
