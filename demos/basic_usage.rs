//! Basic usage example for the Freenom client
//!
//! This example demonstrates how to:
//! - Create a client with default settings
//! - Log in with account credentials
//! - Read account details
//! - List renewals and renew every domain inside the renewal window
//!
//! Note: this example needs real Freenom credentials in the FREENOM_EMAIL
//! and FREENOM_PASSWORD environment variables.

use freenom_client::FreenomClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let email = std::env::var("FREENOM_EMAIL").expect("FREENOM_EMAIL environment variable not set");
    let password =
        std::env::var("FREENOM_PASSWORD").expect("FREENOM_PASSWORD environment variable not set");

    let mut client = FreenomClient::new()?;

    println!("> Logging in");
    let name = client.login(&email, &password).await?;
    println!("Logged in as: {name}");

    println!("\n> Getting account info");
    let info = client.account_info().await?;
    println!("Full Name: {} {}", info.first_name, info.last_name);
    println!("Email: {}", info.email);
    println!("Phone: {}", info.phone);

    println!("\n> Getting renewals");
    let renewals = client.renewals().await?;
    let renewable: Vec<_> = renewals.iter().filter(|d| d.is_renewable()).collect();
    println!(
        "{} domains, {} inside the renewal window",
        renewals.len(),
        renewable.len()
    );

    for domain in renewable {
        let order_id = client.renew_domain(domain.id, 12).await?;
        println!(
            "Successfully renewed {} (#{}), order ID: {order_id}",
            domain.name, domain.id
        );
    }

    client.logout().await?;
    println!("\nDone");

    Ok(())
}
