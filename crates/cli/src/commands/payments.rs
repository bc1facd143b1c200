use clap::Subcommand;
use serde::Serialize;

use super::print_table;
use crate::{
    client::{query, ApiClient, ClientError},
    models::{MessageResponse, Payment, PaymentResponse},
    table::{optional, Table},
};

#[derive(Subcommand)]
pub(crate) enum PaymentCommand {
    /// List visible payments.
    List {
        /// Only list payments of the provided event inventory.
        #[arg(short, long)]
        inventory_id: Option<i64>,
    },

    /// Record an amount paid towards a payment.
    Pay {
        /// Payment identifier.
        payment_id: i64,

        /// Total amount paid so far.
        amount_paid: f64,

        /// Payment method, for example cash.
        #[arg(short, long)]
        method: Option<String>,
    },

    /// Delete a payment record.
    Delete {
        /// Payment identifier.
        payment_id: i64,
    },
}

#[derive(Serialize)]
struct PaymentUpdateRequest {
    amount_paid: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
}

pub(crate) fn run(client: &ApiClient, command: PaymentCommand) -> Result<(), ClientError> {
    match command {
        PaymentCommand::List { inventory_id } => {
            let payments: Vec<Payment> = client.get(&query(
                "/payments",
                [("event_inventory_id", inventory_id.map(|id| id.to_string()))],
            ))?;

            print_table(&payment_table(&payments));
        }
        PaymentCommand::Pay {
            payment_id,
            amount_paid,
            method,
        } => {
            let response: PaymentResponse = client.put(
                &format!("/payments/{payment_id}"),
                &PaymentUpdateRequest {
                    amount_paid,
                    method,
                },
            )?;

            println!(
                "{} Payment #{} is {} ({:.2} of {:.2} {}).",
                response.message,
                response.payment.id,
                response.payment.status.to_lowercase(),
                response.payment.amount_paid,
                response.payment.amount_to_pay,
                response.payment.currency
            );
        }
        PaymentCommand::Delete { payment_id } => {
            let response: MessageResponse = client.delete(&format!("/payments/{payment_id}"))?;

            println!("{}", response.message);
        }
    }

    Ok(())
}

fn payment_table(payments: &[Payment]) -> Table {
    let mut table = Table::new([
        "ID",
        "Inventory",
        "Breeder",
        "Type",
        "Owed",
        "Paid",
        "Status",
        "Description",
    ]);

    for payment in payments {
        table.row([
            payment.id.to_string(),
            payment.event_inventory_id.to_string(),
            payment.breeder_id.to_string(),
            payment.payment_type.to_lowercase(),
            format!("{:.2} {}", payment.amount_to_pay, payment.currency),
            format!("{:.2}", payment.amount_paid),
            payment.status.to_lowercase(),
            optional(payment.description.as_ref()),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::payment_table;
    use crate::models::Payment;

    #[test]
    fn payment_rows() {
        let payments: Vec<Payment> = serde_json::from_value(json!([{
            "id": 3,
            "event_inventory_id": 1,
            "breeder_id": 2,
            "amount_to_pay": 10.0,
            "amount_paid": 2.5,
            "currency": "USD",
            "method": null,
            "payment_type": "BIRD_FEE",
            "status": "PARTIAL",
            "description": null,
            "paid_at": null,
            "created_at": 1709294400
        }]))
        .unwrap();

        let rendered = payment_table(&payments).to_string();
        let row = rendered.lines().nth(2).unwrap();

        assert!(row.starts_with("3   1"));
        assert!(row.contains("bird_fee"));
        assert!(row.contains("10.00 USD"));
        assert!(row.contains("2.50"));
        assert!(row.ends_with("partial  -"));
    }
}
