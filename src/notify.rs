use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;

use crate::{config::EmailConfig, models::OrderLine};

/// Everything the operator email needs about a freshly placed order.
#[derive(Debug, Clone)]
pub struct OrderNotification {
    pub order_id: i64,
    pub total_amount: i64,
    pub customer_notes: Option<String>,
    pub buyer_name: String,
    pub profile_url: Option<String>,
    pub phone_number: String,
    pub bank_number: String,
    pub email: Option<String>,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// Best-effort side effect of checkout. Callers capture and log the error;
/// a failed notification never fails or rolls back the order.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn order_placed(&self, order: &OrderNotification) -> Result<(), NotifyError>;
}

pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    admin_address: String,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            admin_address: config.admin_address.clone(),
        })
    }
}

#[async_trait]
impl OrderNotifier for SmtpNotifier {
    async fn order_placed(&self, order: &OrderNotification) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(self
                .admin_address
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(self.admin_address.clone()))?)
            .subject(format!(
                "New Order #{} - BallisticWorks Market",
                order.order_id
            ))
            .header(ContentType::TEXT_HTML)
            .body(render_order_email(order))?;

        self.mailer.send(message).await?;

        tracing::info!(order_id = order.order_id, "order notification sent");
        Ok(())
    }
}

/// Used when no SMTP relay is configured; checkout proceeds without mail.
pub struct NoopNotifier;

#[async_trait]
impl OrderNotifier for NoopNotifier {
    async fn order_placed(&self, order: &OrderNotification) -> Result<(), NotifyError> {
        tracing::debug!(order_id = order.order_id, "email disabled, skipping notification");
        Ok(())
    }
}

pub fn format_price(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

fn render_order_email(order: &OrderNotification) -> String {
    let items = order
        .lines
        .iter()
        .map(|line| {
            format!(
                "{} x{} - {}",
                line.product_name,
                line.quantity,
                format_price(line.unit_price * i64::from(line.quantity))
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let notes = order
        .customer_notes
        .as_deref()
        .map(|notes| format!("<p><strong>Customer Notes:</strong> {notes}</p>"))
        .unwrap_or_default();

    format!(
        r#"<h2>New Order Received</h2>
<p><strong>Order ID:</strong> {order_id}</p>
<p><strong>Customer:</strong> {buyer}</p>
<p><strong>Steam Profile:</strong> {profile}</p>
<p><strong>Phone:</strong> {phone}</p>
<p><strong>Bank:</strong> {bank}</p>
<p><strong>Email:</strong> {email}</p>
<p><strong>Total:</strong> {total}</p>

<h3>Items:</h3>
<pre>{items}</pre>

{notes}

<p>Login to admin panel to manage this order.</p>"#,
        order_id = order.order_id,
        buyer = order.buyer_name,
        profile = order.profile_url.as_deref().unwrap_or("-"),
        phone = order.phone_number,
        bank = order.bank_number,
        email = order.email.as_deref().unwrap_or("Not provided"),
        total = format_price(order.total_amount),
        items = items,
        notes = notes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_cents_as_dollars() {
        assert_eq!(format_price(2500), "$25.00");
        assert_eq!(format_price(105), "$1.05");
        assert_eq!(format_price(0), "$0.00");
    }

    #[test]
    fn email_body_lists_items_and_total() {
        let order = OrderNotification {
            order_id: 7,
            total_amount: 2500,
            customer_notes: Some("leave at the gate".into()),
            buyer_name: "John Doe".into(),
            profile_url: None,
            phone_number: "555-0101".into(),
            bank_number: "1234".into(),
            email: None,
            lines: vec![OrderLine {
                product_id: 1,
                product_name: "Rifle Scope".into(),
                quantity: 2,
                unit_price: 1000,
            }],
        };

        let body = render_order_email(&order);
        assert!(body.contains("Order ID:</strong> 7"));
        assert!(body.contains("Rifle Scope x2 - $20.00"));
        assert!(body.contains("$25.00"));
        assert!(body.contains("leave at the gate"));
        assert!(body.contains("Not provided"));
    }
}
