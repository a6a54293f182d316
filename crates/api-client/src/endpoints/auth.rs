//! Customer authentication endpoints
//!
//! The webservice has no login call. A login looks the customer up by
//! email and checks the password against the stored hash with a
//! [`PasswordVerifier`] supplied by the caller.

use crate::client::PrestashopClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{Credentials, Customer, NewCustomer};
use crate::query::ApiQuery;
use crate::transform;
use tracing::{debug, info};

/// Webservice resource name
const RESOURCE: &str = "customers";

/// Message used for every failed login, so responses do not reveal which
/// emails are registered
const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Checks a plain password against a stored PrestaShop hash
pub trait PasswordVerifier: Send + Sync {
    /// Whether `password` matches `hash`
    fn verify(&self, password: &str, hash: &str) -> bool;
}

impl<F> PasswordVerifier for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn verify(&self, password: &str, hash: &str) -> bool {
        self(password, hash)
    }
}

/// Authentication API interface
#[derive(Clone)]
pub struct AuthApi {
    client: PrestashopClient,
}

impl AuthApi {
    /// Create a new auth API interface
    pub(crate) fn new(client: PrestashopClient) -> Self {
        Self { client }
    }

    /// Look a customer up by email
    ///
    /// GET /customers?display=full&filter[email]=[<email>]
    pub async fn find_customer_by_email(&self, email: &str) -> ApiResult<Option<Customer>> {
        let email = normalize_email(email);
        let query = ApiQuery::full().filter("email", &email).limit(0, 1);
        let response = self.client.get_json(RESOURCE, &query).await?;

        let ctx = self.client.transform_context();
        Ok(transform::first_record(&response, "customers", "customer")
            .map(|raw| transform::transform_customer(raw, &ctx)))
    }

    /// Get a customer by id
    pub async fn get_customer(&self, id: &str) -> ApiResult<Customer> {
        let query = ApiQuery::full().filter("id", id);
        let response = self.client.get_json(RESOURCE, &query).await?;

        let ctx = self.client.transform_context();
        transform::first_record(&response, "customers", "customer")
            .map(|raw| transform::transform_customer(raw, &ctx))
            .ok_or_else(|| ApiError::not_found("customer", id))
    }

    /// Check credentials.
    ///
    /// An unknown email, a disabled account and a wrong password all fail with
    /// [`ApiError::Unauthorized`].
    pub async fn login<V>(&self, credentials: &Credentials, verifier: &V) -> ApiResult<Customer>
    where
        V: PasswordVerifier + ?Sized,
    {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(ApiError::validation("email and password are required"));
        }

        let Some(customer) = self.find_customer_by_email(&credentials.email).await? else {
            debug!("Login for unknown email");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !customer.active {
            debug!(customer_id = %customer.id, "Login for disabled account");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !verifier.verify(&credentials.password, &customer.password_hash) {
            debug!(customer_id = %customer.id, "Password mismatch");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        info!(customer_id = %customer.id, "Customer logged in");
        Ok(customer)
    }

    /// Register a new customer
    ///
    /// POST /customers
    pub async fn register(&self, customer: &NewCustomer) -> ApiResult<Customer> {
        validate_registration(customer)?;

        if self.find_customer_by_email(&customer.email).await?.is_some() {
            return Err(ApiError::Conflict {
                entity: "customer",
                key: normalize_email(&customer.email),
            });
        }

        let body = transform::customer_to_raw(&NewCustomer {
            email: normalize_email(&customer.email),
            ..customer.clone()
        });
        let response = self.client.post_json(RESOURCE, &body).await?;

        let ctx = self.client.transform_context();
        let created = transform::first_record(&response, "customers", "customer")
            .map(|raw| transform::transform_customer(raw, &ctx))
            .ok_or_else(|| ApiError::UnexpectedResponse("customer creation returned no record".into()))?;

        info!(customer_id = %created.id, "Customer registered");
        Ok(created)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(customer: &NewCustomer) -> ApiResult<()> {
    let email = customer.email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(ApiError::validation(format!("invalid email address: {email}")));
    }
    if customer.password.chars().count() < 5 {
        return Err(ApiError::validation("password must be at least 5 characters"));
    }
    if customer.firstname.trim().is_empty() || customer.lastname.trim().is_empty() {
        return Err(ApiError::validation("first and last name are required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_customer(email: &str, password: &str) -> NewCustomer {
        NewCustomer {
            email: email.into(),
            password: password.into(),
            firstname: "Ana".into(),
            lastname: "López".into(),
            newsletter: false,
        }
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration(&new_customer("ana@example.com", "secreto")).is_ok());
        assert!(validate_registration(&new_customer("ana", "secreto")).is_err());
        assert!(validate_registration(&new_customer("@example.com", "secreto")).is_err());
        assert!(validate_registration(&new_customer("ana@example.com", "123")).is_err());
    }

    #[test]
    fn test_closure_verifier() {
        let verifier = |password: &str, hash: &str| hash == format!("hashed:{password}");
        assert!(verifier.verify("abc", "hashed:abc"));
        assert!(!verifier.verify("abc", "hashed:xyz"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
