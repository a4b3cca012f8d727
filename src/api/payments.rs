//! Payment endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::tags::{PAYMENT, PAYMENT_METHODS};
use super::{decode, ApiClient, Mutation, Query};
use crate::cache::Tag;
use crate::error::SokoError;
use crate::http::{unwrap_envelope, RequestDescriptor};
use crate::payment::{PaymentPoller, PaymentStatusSource, PollHandle, PollPolicy};
use crate::types::{
    EntityId, PaymentRecord, ProductPaymentRequest, SubscriptionPaymentRequest,
    VerifyPaymentRequest,
};

pub struct InitiateProductPayment;

impl Mutation for InitiateProductPayment {
    const NAME: &'static str = "initiate_product_payment";
    type Args = ProductPaymentRequest;
    type Output = PaymentRecord;

    fn request(args: &ProductPaymentRequest) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::post("/product/").json(args)
    }

    fn transform(raw: Value) -> Result<PaymentRecord, SokoError> {
        decode(raw)
    }

    fn invalidates_tags(_: &ProductPaymentRequest, _: &PaymentRecord) -> Vec<Tag> {
        vec![Tag::kind(PAYMENT)]
    }
}

pub struct InitiateSubscriptionPayment;

impl Mutation for InitiateSubscriptionPayment {
    const NAME: &'static str = "initiate_subscription_payment";
    type Args = SubscriptionPaymentRequest;
    type Output = PaymentRecord;

    fn request(args: &SubscriptionPaymentRequest) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::post("/subscription/").json(args)
    }

    fn transform(raw: Value) -> Result<PaymentRecord, SokoError> {
        decode(raw)
    }

    fn invalidates_tags(_: &SubscriptionPaymentRequest, _: &PaymentRecord) -> Vec<Tag> {
        vec![Tag::kind(PAYMENT)]
    }
}

pub struct VerifyPayment;

impl Mutation for VerifyPayment {
    const NAME: &'static str = "verify_payment";
    type Args = VerifyPaymentRequest;
    type Output = PaymentRecord;

    fn request(args: &VerifyPaymentRequest) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::post("/verify-payment/").json(args)
    }

    fn transform(raw: Value) -> Result<PaymentRecord, SokoError> {
        decode(raw)
    }

    fn invalidates_tags(args: &VerifyPaymentRequest, _: &PaymentRecord) -> Vec<Tag> {
        vec![Tag::item(PAYMENT, args.payment_id.clone())]
    }
}

pub struct PaymentMethods;

impl Query for PaymentMethods {
    const NAME: &'static str = "payment_methods";
    type Args = ();
    type Output = Value;

    fn request(_: &()) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::get("/payment-methods/"))
    }

    fn transform(raw: Value) -> Result<Value, SokoError> {
        Ok(unwrap_envelope(raw))
    }

    fn provides_tags(_: &(), _: &Value) -> Vec<Tag> {
        vec![Tag::kind(PAYMENT_METHODS)]
    }
}

impl ApiClient {
    pub async fn initiate_product_payment(
        &self,
        request: &ProductPaymentRequest,
    ) -> Result<PaymentRecord, SokoError> {
        self.mutate::<InitiateProductPayment>(request).await
    }

    pub async fn initiate_subscription_payment(
        &self,
        request: &SubscriptionPaymentRequest,
    ) -> Result<PaymentRecord, SokoError> {
        self.mutate::<InitiateSubscriptionPayment>(request).await
    }

    /// Ask the backend for the current state of a payment. A response that
    /// omits the gateway reference gets the requested id filled in.
    pub async fn verify_payment(&self, payment_id: impl Into<EntityId>) -> Result<PaymentRecord, SokoError> {
        let request = VerifyPaymentRequest {
            payment_id: payment_id.into(),
        };
        let mut record = self.mutate::<VerifyPayment>(&request).await?;
        if record.payment_id.is_none() {
            record.payment_id = Some(request.payment_id);
        }
        Ok(record)
    }

    pub async fn payment_methods(&self) -> Result<Value, SokoError> {
        self.query::<PaymentMethods>(&()).await
    }

    /// Poll `/verify-payment/` in the background at the configured interval.
    pub fn watch_payment(&self, payment_id: impl Into<EntityId>) -> PollHandle {
        let policy = PollPolicy::default().with_interval(self.config().poll_interval);
        self.watch_payment_with(payment_id, policy)
    }

    pub fn watch_payment_with(&self, payment_id: impl Into<EntityId>, policy: PollPolicy) -> PollHandle {
        PaymentPoller::new(Arc::new(self.clone()), policy).spawn(payment_id.into())
    }
}

#[async_trait]
impl PaymentStatusSource for ApiClient {
    async fn payment_status(&self, payment_id: &EntityId) -> Result<PaymentRecord, SokoError> {
        self.verify_payment(payment_id.clone()).await
    }
}
