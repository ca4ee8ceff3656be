//! The checkout orchestrator.
//!
//! Owns the cart-to-order flow: cart retrieval, order creation, delivery
//! method changes, payment initiation, and payment outcome reconciliation.
//! Execution is event-driven and single-flow; the only guards needed are an
//! in-progress flag against double submission, a monotonic sequence for
//! last-write-wins delivery updates, and a flow epoch so completions that
//! arrive after a reset never touch state.
//!
//! Cart clearing policy: the persisted cart is cleared only once a `paid` or
//! `pending` payment outcome is recorded against a durably created order.
//! A `failed` outcome keeps the cart so the buyer can retry with another
//! method.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rust_decimal::Decimal;
use uuid::Uuid;

use lapacho_core::{
    Cart, Delivery, DeliveryMethod, Order, PaymentAttempt, PaymentId, PaymentMethod,
    PaymentStatus, PreferenceId, ProviderPaymentStatus,
};

use crate::api::{
    CheckoutSessionRequest, CreateOrderRequest, OrderApi, OrderItemInput, OrderPatch,
    PaymentGateway, Payer, SessionItem,
};
use crate::error::CheckoutError;
use crate::normalize::ContactPrefill;
use crate::session::AuthSession;
use crate::store::CartStore;
use crate::validate::{self, CheckoutForm};

/// Outcome of a delivery-method update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryUpdate {
    /// The update was applied; this is the authoritative order.
    Applied(Order),
    /// A newer update was issued while this one was in flight; its response
    /// was discarded without touching local state.
    Superseded,
}

/// Outcome of initiating payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentInitiation {
    /// Provider-redirect payment: send the buyer here.
    Redirect {
        preference_id: PreferenceId,
        redirect_url: String,
    },
    /// Deferred cash payment: the order stays pending, no provider contact.
    Deferred(Order),
}

/// A payment result as reported by the provider, via redirect query
/// parameters or the relay webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutcome {
    pub payment_id: Option<PaymentId>,
    pub status: ProviderPaymentStatus,
    pub amount: Option<Decimal>,
}

#[derive(Default)]
struct FlowState {
    order: Option<Order>,
    idempotency_key: Option<Uuid>,
    applied_delivery_seq: u64,
    preference: Option<PreferenceId>,
    payment_hint: Option<PaymentMethod>,
    attempts: Vec<PaymentAttempt>,
}

/// Converts a local cart into a confirmed order, coordinating with the order
/// API and the payment relay.
pub struct CheckoutOrchestrator<S, A, P> {
    store: S,
    orders: A,
    gateway: P,
    return_url: String,
    /// Re-entry guard: set while an order creation request is in flight.
    creating: AtomicBool,
    /// Last issued delivery-update sequence number.
    delivery_seq: AtomicU64,
    /// Flow epoch; bumped by [`Self::reset`]. Completions for a stale epoch
    /// are discarded.
    epoch: AtomicU64,
    state: Mutex<FlowState>,
}

impl<S, A, P> CheckoutOrchestrator<S, A, P>
where
    S: CartStore,
    A: OrderApi,
    P: PaymentGateway,
{
    /// Create an orchestrator over the injected collaborators.
    ///
    /// `return_url` is the public URL the payment provider redirects back to.
    pub fn new(store: S, orders: A, gateway: P, return_url: impl Into<String>) -> Self {
        Self {
            store,
            orders,
            gateway,
            return_url: return_url.into(),
            creating: AtomicBool::new(false),
            delivery_seq: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
            state: Mutex::new(FlowState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FlowState> {
        self.state.lock().expect("flow state mutex poisoned")
    }

    /// The current local order, if one has been created in this flow.
    #[must_use]
    pub fn current_order(&self) -> Option<Order> {
        self.state().order.clone()
    }

    /// The payment method hinted at order creation, if any.
    #[must_use]
    pub fn payment_hint(&self) -> Option<PaymentMethod> {
        self.state().payment_hint
    }

    /// Payment attempts recorded so far; the last one is authoritative.
    #[must_use]
    pub fn payment_attempts(&self) -> Vec<PaymentAttempt> {
        self.state().attempts.clone()
    }

    /// The provider checkout handle from the last gateway initiation.
    #[must_use]
    pub fn preference_id(&self) -> Option<PreferenceId> {
        self.state().preference.clone()
    }

    /// Abandon the current flow. In-flight completions for the old flow are
    /// discarded when they arrive.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.creating.store(false, Ordering::SeqCst);
        *self.state() = FlowState::default();
    }

    /// Read the persisted cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when the cart is absent, empty,
    /// or unreadable; the caller should redirect to the cart view.
    pub fn load_cart(&self) -> Result<Cart, CheckoutError> {
        let cart = self.store.get().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "cart store unreadable, treating as empty");
            Cart::default()
        });
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(cart)
    }

    /// Best-effort contact prefill from the authenticated profile.
    ///
    /// Fetch failures are non-fatal: the form simply starts blank.
    pub async fn prefill_contact(&self, session: &AuthSession) -> ContactPrefill {
        match self.orders.fetch_profile(session).await {
            Ok(prefill) => prefill,
            Err(err) => {
                tracing::debug!(error = %err, "profile fetch failed, leaving contact blank");
                ContactPrefill::default()
            }
        }
    }

    /// Create an order from the cart.
    ///
    /// Validates before any network call, requires a session, and refuses
    /// re-entry while a creation request is in flight. Line items are priced
    /// from the cart snapshot. Retries after a network failure reuse the
    /// same idempotency key, so they cannot duplicate the order.
    ///
    /// # Errors
    ///
    /// `Validation`, `AuthRequired`, `EmptyCart`, `RequestInFlight`,
    /// `NetworkError`, `ServerRejection`, or fatal `InvalidResponse`.
    pub async fn create_order(
        &self,
        cart: &Cart,
        form: &CheckoutForm,
        method: DeliveryMethod,
        payment_hint: PaymentMethod,
        session: Option<&AuthSession>,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let validated = validate::validate(form, method)?;
        let session = session.ok_or(CheckoutError::AuthRequired)?;

        if self.creating.swap(true, Ordering::SeqCst) {
            return Err(CheckoutError::RequestInFlight);
        }
        let result = self
            .create_order_guarded(cart, validated, method, payment_hint, session)
            .await;
        self.creating.store(false, Ordering::SeqCst);
        result
    }

    async fn create_order_guarded(
        &self,
        cart: &Cart,
        validated: validate::ValidatedForm,
        method: DeliveryMethod,
        payment_hint: PaymentMethod,
        session: &AuthSession,
    ) -> Result<Order, CheckoutError> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        // Reused across retries until creation succeeds.
        let key = *self
            .state()
            .idempotency_key
            .get_or_insert_with(Uuid::new_v4);

        let delivery = Delivery {
            method,
            cost: method.cost(),
            address: validated.address,
            city: validated.city,
        };
        let request = CreateOrderRequest {
            items: cart
                .items
                .iter()
                .map(|item| OrderItemInput {
                    product_id: item.product_id,
                    variant_id: item.variant_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            contact: validated.contact,
            delivery,
            notes: validated.notes,
            total: cart.subtotal() + method.cost(),
        };

        let order = self.orders.create_order(&request, key, session).await?;

        if self.epoch.load(Ordering::SeqCst) != epoch {
            return Err(CheckoutError::Superseded);
        }

        tracing::info!(order_id = %order.id, order_number = %order.order_number, "order created");
        let mut state = self.state();
        state.idempotency_key = None;
        state.payment_hint = Some(payment_hint);
        state.order = Some(order.clone());
        Ok(order)
    }

    /// Change the delivery method on the current order, recomputing shipping
    /// cost and total.
    ///
    /// Issues a partial update; never creates a new order. When toggles fire
    /// in quick succession, only the most recently issued request may be
    /// applied: an in-flight update superseded by a newer one is discarded
    /// on completion regardless of response arrival order.
    ///
    /// # Errors
    ///
    /// `NoActiveOrder`, `OrderFinalized`, or any order API error.
    pub async fn update_delivery_method(
        &self,
        method: DeliveryMethod,
        session: &AuthSession,
    ) -> Result<DeliveryUpdate, CheckoutError> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let mut order = self.state().order.clone().ok_or(CheckoutError::NoActiveOrder)?;
        if order.payment_status.is_terminal() {
            return Err(CheckoutError::OrderFinalized(order.payment_status));
        }

        let seq = self.delivery_seq.fetch_add(1, Ordering::SeqCst) + 1;

        order.set_delivery_method(method);
        let patch = OrderPatch {
            total: Some(order.total),
            delivery: Some(order.delivery.clone()),
            ..OrderPatch::default()
        };

        let updated = self.orders.update_order(order.id, &patch, session).await?;

        if self.epoch.load(Ordering::SeqCst) != epoch
            || self.delivery_seq.load(Ordering::SeqCst) != seq
        {
            tracing::debug!(seq, "delivery update superseded, discarding response");
            return Ok(DeliveryUpdate::Superseded);
        }

        let mut state = self.state();
        if state.applied_delivery_seq > seq {
            return Ok(DeliveryUpdate::Superseded);
        }
        state.applied_delivery_seq = seq;
        state.order = Some(updated.clone());
        Ok(DeliveryUpdate::Applied(updated))
    }

    /// Initiate payment for the current order.
    ///
    /// Gateway payment requests a provider checkout session scoped to the
    /// order and hands back a redirect URL; the cart is kept until the
    /// provider reports an outcome. Cash payment records the method, leaves
    /// the order pending without contacting the provider, and clears the
    /// cart (the pending outcome is durably recorded).
    ///
    /// # Errors
    ///
    /// `NoActiveOrder`, `OrderFinalized`, `Provider`, or any order API error.
    pub async fn initiate_payment(
        &self,
        method: PaymentMethod,
        session: &AuthSession,
    ) -> Result<PaymentInitiation, CheckoutError> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let order = self.state().order.clone().ok_or(CheckoutError::NoActiveOrder)?;
        if order.payment_status.is_terminal() {
            return Err(CheckoutError::OrderFinalized(order.payment_status));
        }

        match method {
            PaymentMethod::Cash => {
                let patch = OrderPatch {
                    payment_method: Some(PaymentMethod::Cash),
                    ..OrderPatch::default()
                };
                let updated = self.orders.update_order(order.id, &patch, session).await?;

                if self.epoch.load(Ordering::SeqCst) != epoch {
                    return Err(CheckoutError::Superseded);
                }
                self.state().order = Some(updated.clone());
                self.clear_cart_best_effort();
                tracing::info!(order_id = %updated.id, "cash order confirmed, payment deferred");
                Ok(PaymentInitiation::Deferred(updated))
            }
            PaymentMethod::Gateway => {
                let request = CheckoutSessionRequest {
                    order_id: order.id,
                    items: order
                        .items
                        .iter()
                        .map(|line| SessionItem {
                            title: line.name.clone(),
                            quantity: line.quantity,
                            unit_price: line.unit_price,
                        })
                        .collect(),
                    payer: Payer {
                        name: order.contact.name.clone(),
                        surname: order.contact.surname.clone(),
                        email: order.contact.email.to_string(),
                        phone: order.contact.phone.clone(),
                    },
                    return_url: self.return_url.clone(),
                };

                let checkout = self.gateway.create_checkout_session(&request).await?;

                if self.epoch.load(Ordering::SeqCst) != epoch {
                    return Err(CheckoutError::Superseded);
                }
                let mut state = self.state();
                state.preference = Some(checkout.preference_id.clone());
                if let Some(order) = state.order.as_mut() {
                    order.payment_method = Some(PaymentMethod::Gateway);
                }
                tracing::info!(
                    order_id = %order.id,
                    preference_id = %checkout.preference_id,
                    "provider checkout session created"
                );
                Ok(PaymentInitiation::Redirect {
                    preference_id: checkout.preference_id,
                    redirect_url: checkout.redirect_url,
                })
            }
        }
    }

    /// Reconcile a provider-reported payment outcome into order state.
    ///
    /// Maps the provider status onto the order's payment status and issues a
    /// final update to the order API. If that update fails for a paid
    /// outcome, the cart is still cleared and the mapped status kept locally:
    /// payment truth lives with the provider and its webhook, and the
    /// server-side status catches up on the next fetch.
    ///
    /// Re-delivery of an outcome the order already carries is an idempotent
    /// no-op; a transition out of a terminal state is refused.
    ///
    /// # Errors
    ///
    /// `NoActiveOrder` or `OrderFinalized`.
    pub async fn reconcile_payment_outcome(
        &self,
        outcome: &ProviderOutcome,
        session: &AuthSession,
    ) -> Result<Order, CheckoutError> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let mut order = self.state().order.clone().ok_or(CheckoutError::NoActiveOrder)?;
        let mapped = outcome.status.into_payment_status();

        if order.payment_status != mapped {
            order
                .apply_payment_status(mapped)
                .map_err(|err| CheckoutError::OrderFinalized(err.from))?;
        }

        let method = order.payment_method.unwrap_or(PaymentMethod::Gateway);
        let patch = OrderPatch {
            payment_status: Some(mapped),
            payment_method: Some(method),
            ..OrderPatch::default()
        };

        let reconciled = match self.orders.update_order(order.id, &patch, session).await {
            Ok(mut updated) => {
                // The server may not have seen the webhook yet; the provider
                // outcome we hold is newer.
                if updated.payment_status != mapped {
                    updated.payment_status = mapped;
                }
                updated
            }
            Err(err) => {
                tracing::warn!(
                    order_id = %order.id,
                    error = %err,
                    "order update failed; displayed status will lag until the next fetch"
                );
                order
            }
        };

        if self.epoch.load(Ordering::SeqCst) != epoch {
            return Err(CheckoutError::Superseded);
        }

        {
            let mut state = self.state();
            state.order = Some(reconciled.clone());
            if let Some(payment_id) = outcome.payment_id.clone() {
                state.attempts.push(PaymentAttempt {
                    payment_id,
                    status: mapped,
                    amount: outcome.amount.unwrap_or(reconciled.total),
                    method,
                });
            }
        }

        match mapped {
            PaymentStatus::Paid | PaymentStatus::Pending => self.clear_cart_best_effort(),
            PaymentStatus::Failed => {
                tracing::info!(order_id = %reconciled.id, "payment failed, keeping cart for retry");
            }
        }

        Ok(reconciled)
    }

    fn clear_cart_best_effort(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear persisted cart");
        }
    }
}
