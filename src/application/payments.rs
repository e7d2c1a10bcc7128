use super::marketplace::Marketplace;
use crate::domain::payment::PaymentRecord;
use crate::domain::principal::Access;
use crate::error::{MarketplaceError, Result};

impl Marketplace {
    /// Payment history of the caller, newest first.
    ///
    /// `email` may only name the caller; without it the caller's own history
    /// is returned.
    pub async fn list_payments(
        &self,
        credential: &str,
        email: Option<&str>,
    ) -> Result<Vec<PaymentRecord>> {
        let principal = self.authorize(credential, Access::Authenticated).await?;
        if let Some(email) = email
            && !principal.is(email)
        {
            return Err(MarketplaceError::Forbidden(format!(
                "{} may not read payments of {}",
                principal, email
            )));
        }

        let mut payments = self.payments.get_all().await?;
        payments.retain(|payment| principal.is(&payment.customer_email));
        sort_newest_first(&mut payments);
        Ok(payments)
    }

    /// Every recorded payment, newest first. Admin only.
    pub async fn list_all_payments(&self, credential: &str) -> Result<Vec<PaymentRecord>> {
        self.authorize(credential, Access::Admin).await?;
        let mut payments = self.payments.get_all().await?;
        sort_newest_first(&mut payments);
        Ok(payments)
    }
}

fn sort_newest_first(payments: &mut [PaymentRecord]) {
    payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
}
