//! CLI auth command handlers for login, logout, and whoami.

use std::io::BufRead;

use crate::api::ApiClient;
use crate::error::SokoError;
use crate::types::{LoginRequest, User};

/// Handle `soko auth login <email>`.
pub async fn handle_login(
    client: &ApiClient,
    email: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match password {
        Some(password) => password,
        None => {
            eprint!("Password: ");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    match client.login(&LoginRequest::new(email, password)).await {
        Ok(user) => {
            println!("✅ Logged in as {}", display_name(&user));
            Ok(())
        }
        Err(SokoError::Validation(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("  {field}: {message}");
            }
            Err("invalid login details".into())
        }
        Err(err) => Err(err.display_message().into()),
    }
}

/// Handle `soko auth logout`.
pub async fn handle_logout(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    client.logout().await?;
    println!("✅ Logged out");
    Ok(())
}

/// Handle `soko auth whoami`.
pub async fn handle_whoami(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    match client.restore_session().await? {
        Some(user) => {
            println!("{}", display_name(&user));
            if let Some(email) = &user.email {
                println!("   email: {email}");
            }
            println!("   id:    {}", user.id);
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

fn display_name(user: &User) -> String {
    user.username
        .clone()
        .or_else(|| user.email.clone())
        .unwrap_or_else(|| user.id.to_string())
}
