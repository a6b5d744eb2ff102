//! Bot Engine Orchestrator (component M): the 9-step pipeline a single
//! inbound message runs through.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reserva_config::{service_resolver, IntentCatalog, ServiceConfig};
use reserva_core::domain::{
    Company, Conversation, ConversationState, DraftItem, IntentLabel, PaymentStatus, Product,
    Reservation, ReservationItem,
};
use reserva_core::{Clock, ReservaError};
use reserva_llm::{ExtractedData, LlmClassifier, PromptBuilder, RecentTurn, Tier3Outcome};
use reserva_nlp::{
    match_products, Entity, EntityExtractor, EntityType, KeywordDetector, SimilarityMatcher,
    TextNormalizer, TierOneOutcome, TierTwoOutcome,
};
use reserva_persistence::{
    companies, conversations, payments, products, reservations, resources, user_preferences, users,
};
use reserva_tools::payment::PaymentProvider;
use sqlx::PgPool;
use uuid::Uuid;

use crate::context_store::{ContextKey, ContextStore};
use crate::error::map_persistence;
use crate::field_validator;
use crate::metrics::{self as agent_metrics, TierTiming};
use crate::reservation_flow::ReservationFlow;

/// The inbound message contract of §6: exactly one of `user_id`/`phone`
/// must be supplied by the caller.
pub struct InboundMessage {
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    pub phone: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub reply: String,
    pub intention: IntentLabel,
    pub confidence: f32,
    pub missing_fields: Vec<String>,
    pub conversation_state: ConversationState,
    pub conversation_id: Uuid,
}

const PER_MESSAGE_DEADLINE: Duration = Duration::from_secs(8);
const TIER3_DEADLINE: Duration = Duration::from_secs(4);

/// Internal `collected` bookkeeping keys driving the cancel list/select/
/// confirm sub-flow (§4.M step 5). Not part of the wire-stable state
/// machine: a conversation mid cancel-flow stays in whatever
/// `ConversationState` it was already in.
const CANCEL_FLOW_FIELD: &str = "__cancel_flow";
const CANCEL_TARGET_FIELD: &str = "__cancel_target";

pub struct BotEngine<C: Clock, P: PaymentProvider> {
    pool: PgPool,
    context: Arc<ContextStore>,
    catalog: Arc<IntentCatalog>,
    normalizer: TextNormalizer,
    extractor: EntityExtractor,
    keyword: KeywordDetector,
    similarity: SimilarityMatcher,
    llm: Arc<LlmClassifier>,
    reservation_flow: Arc<ReservationFlow<C>>,
    payment_provider: Arc<P>,
    clock: Arc<C>,
}

impl<C: Clock, P: PaymentProvider> BotEngine<C, P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        context: Arc<ContextStore>,
        catalog: Arc<IntentCatalog>,
        llm: Arc<LlmClassifier>,
        reservation_flow: Arc<ReservationFlow<C>>,
        payment_provider: Arc<P>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            pool,
            context,
            catalog,
            normalizer: TextNormalizer::new(),
            extractor: EntityExtractor::new(),
            keyword: KeywordDetector::new(),
            similarity: SimilarityMatcher::new(),
            llm,
            reservation_flow,
            payment_provider,
            clock,
        }
    }

    pub async fn handle_message(
        &self,
        inbound: InboundMessage,
    ) -> Result<OutboundMessage, ReservaError> {
        let started = Instant::now();
        agent_metrics::record_message_received();

        let result = tokio::time::timeout(PER_MESSAGE_DEADLINE, self.handle_message_inner(inbound))
            .await
            .map_err(|_| ReservaError::Timeout(PER_MESSAGE_DEADLINE))
            .and_then(|r| r);

        if result.is_err() {
            agent_metrics::record_error("orchestrator");
        }
        agent_metrics::record_orchestrator_latency(started);
        result
    }

    async fn handle_message_inner(
        &self,
        inbound: InboundMessage,
    ) -> Result<OutboundMessage, ReservaError> {
        // Step 1: resolve the user and acquire the per-key mutex.
        let user = self.resolve_user(&inbound).await?;
        let key = ContextKey::new(inbound.company_id, user.phone.clone());
        let lock = self.context.lock_for(&key);
        let _guard = lock.lock().await;

        // Step 2: load or create the conversation context.
        let mut conversation = self
            .context
            .get(&key)
            .unwrap_or_else(|| Conversation::new(inbound.company_id, user.id));
        conversation.turn_count += 1;

        let company = companies::find_by_id(&self.pool, inbound.company_id)
            .await
            .map_err(map_persistence)?
            .ok_or_else(|| ReservaError::validation("company", "unknown company"))?;

        // Step 3: normalize, extract entities.
        let normalized = self.normalizer.normalize(&inbound.message);
        let today = self.clock.now().date_naive();
        let entities = self.extractor.extract(&normalized.text, today);

        // A conversation mid cancel list/select/confirm sub-flow skips the
        // usual tier cascade entirely: its next message is always an answer
        // to the cancel prompt, never a fresh intent.
        if conversation.field(CANCEL_FLOW_FIELD).is_some() {
            let reply = self
                .handle_cancel_followup(&company, &mut conversation, &normalized.text)
                .await?;
            return self
                .finish_turn(key, conversation, IntentLabel::Cancelar, 1.0, reply, &company)
                .await;
        }

        // Step 4: Tier 1 -> Tier 2 -> Tier 3 cascade.
        let (intent, confidence, extracted) = self
            .classify(&company, &conversation, &normalized.text, &inbound.message)
            .await;
        conversation.active_intent = Some(intent);

        let extracted_products = extracted.as_ref().map(|e| e.products.clone()).unwrap_or_default();
        self.resolve_service_key(&company, &mut conversation, &normalized.text);

        merge_entities(&mut conversation, &entities);
        if let Some(extracted) = extracted {
            merge_extracted(&mut conversation, extracted);
        }

        let wants_reservation = matches!(intent, IntentLabel::Reservar)
            || (intent == IntentLabel::Otro && conversation.state != ConversationState::Initial);
        if wants_reservation {
            self.merge_draft_items(&company, &mut conversation, &normalized.text, &extracted_products)
                .await?;
        }

        // Steps 5-8: branch on intent.
        let reply = match intent {
            IntentLabel::Cancelar => self.handle_cancel(&company, &mut conversation).await?,
            IntentLabel::Consultar => self.handle_consult(&company).await?,
            IntentLabel::Saludar => self.handle_greeting(&company, &user).await?,
            IntentLabel::Despedida => "¡Hasta pronto!".to_string(),
            IntentLabel::Reservar => self.handle_reservation_turn(&company, &mut conversation).await?,
            IntentLabel::Otro if conversation.state != ConversationState::Initial => {
                self.handle_reservation_turn(&company, &mut conversation).await?
            }
            IntentLabel::Otro => "No entendí tu mensaje, ¿puedes reformularlo?".to_string(),
        };

        // Step 9: persist context, return.
        self.finish_turn(key, conversation, intent, confidence, reply, &company)
            .await
    }

    /// Step 9 shared by every branch: stamp the turn, compute missing
    /// fields, persist context, and build the outbound reply.
    async fn finish_turn(
        &self,
        key: ContextKey,
        mut conversation: Conversation,
        intent: IntentLabel,
        confidence: f32,
        reply: String,
        company: &Company,
    ) -> Result<OutboundMessage, ReservaError> {
        conversation.last_turn_at = self.clock.now();
        let missing_fields = self.current_missing_fields(company, &conversation).await;
        self.context.put(key, conversation.clone());
        self.reservation_flow.persist(&conversation).await?;

        Ok(OutboundMessage {
            reply,
            intention: intent,
            confidence,
            missing_fields,
            conversation_state: conversation.state,
            conversation_id: conversation.id,
        })
    }

    async fn current_missing_fields(&self, company: &Company, conversation: &Conversation) -> Vec<String> {
        let Ok(variants) = products::list_service_variants(&self.pool, company.id).await else {
            return Vec::new();
        };
        let service_key = conversation.service_key.as_deref().unwrap_or_default();
        let variant = variants
            .iter()
            .find(|p| p.service_metadata().map(|m| m.service_key.as_str()) == Some(service_key))
            .or_else(|| variants.first());
        let Some(variant) = variant else {
            return Vec::new();
        };
        let config = service_resolver::resolve(company, variant, &variants);
        field_validator::missing_fields(conversation, &config.validator)
    }

    /// Applies a payment provider webhook (§6). Idempotent: a reference
    /// already past `awaiting_payment` is a no-op, so a retried delivery
    /// never double-confirms or double-cancels a reservation.
    pub async fn handle_payment_webhook(
        &self,
        reference: &str,
        status: PaymentStatus,
    ) -> Result<(), ReservaError> {
        let payment = payments::find_by_reference(&self.pool, reference)
            .await
            .map_err(map_persistence)?
            .ok_or_else(|| ReservaError::validation("payment", "unknown reference"))?;
        let mut conversation = conversations::find_by_id(&self.pool, payment.conversation_id)
            .await
            .map_err(map_persistence)?
            .ok_or_else(|| ReservaError::validation("conversation", "unknown conversation"))?;
        let user = users::find_by_id(&self.pool, conversation.user_id)
            .await
            .map_err(map_persistence)?
            .ok_or_else(|| ReservaError::validation("user", "unknown user"))?;

        let key = ContextKey::new(conversation.company_id, user.phone.clone());
        let lock = self.context.lock_for(&key);
        let _guard = lock.lock().await;

        if conversation.state != ConversationState::AwaitingPayment {
            return Ok(());
        }

        let approved = self
            .reservation_flow
            .apply_payment_webhook(&conversation, reference, status)
            .await?;

        if approved {
            if let Err(e) = self.finalize_paid_reservation(&mut conversation, &user).await {
                conversation.state = ConversationState::Collecting;
                conversation.retries_remaining = conversation.retries_remaining.saturating_sub(1);
                conversation.last_turn_at = self.clock.now();
                self.context.put(key, conversation.clone());
                self.reservation_flow.persist(&conversation).await?;
                return Err(e);
            }
        } else {
            conversation.state = ConversationState::Collecting;
            conversation.retries_remaining = conversation.retries_remaining.saturating_sub(1);
        }

        conversation.last_turn_at = self.clock.now();
        self.context.put(key, conversation.clone());
        self.reservation_flow.persist(&conversation).await
    }

    /// Creates the reservation a `request_payment` call deferred, once the
    /// provider confirms the payment went through.
    async fn finalize_paid_reservation(
        &self,
        conversation: &mut Conversation,
        user: &reserva_core::domain::User,
    ) -> Result<(), ReservaError> {
        let company = companies::find_by_id(&self.pool, conversation.company_id)
            .await
            .map_err(map_persistence)?
            .ok_or_else(|| ReservaError::validation("company", "unknown company"))?;
        let variants = products::list_service_variants(&self.pool, company.id)
            .await
            .map_err(map_persistence)?;
        let service_key = conversation.service_key.clone().unwrap_or_default();
        let variant = variants
            .iter()
            .find(|p| p.service_metadata().map(|m| m.service_key.as_str()) == Some(service_key.as_str()))
            .or_else(|| variants.first())
            .ok_or_else(|| ReservaError::validation("products", "no service variant configured"))?;

        let items = self.resolve_items(conversation, variant).await?;
        let total_price = Reservation::compute_total(&items, 0);
        let date = conversation
            .field("date")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ReservaError::validation("date", "missing or unparsable"))?;
        let time = conversation
            .field("time")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ReservaError::validation("time", "missing or unparsable"))?;
        let guests = conversation.field("guests").and_then(|v| v.parse().ok());
        let phone = conversation
            .field("phone")
            .map(str::to_string)
            .unwrap_or_else(|| user.phone.clone());
        let customer_name = conversation.field("name").map(str::to_string);
        let resource_id = self.resolve_resource(&company, conversation).await?;

        let reservation = self
            .reservation_flow
            .confirm(
                conversation,
                items,
                service_key,
                phone,
                customer_name,
                resource_id,
                total_price,
                date,
                time,
                guests,
            )
            .await?;

        conversation.state = ConversationState::Confirmed;
        conversation.draft_reservation_id = Some(reservation.id);
        Ok(())
    }

    async fn resolve_user(
        &self,
        inbound: &InboundMessage,
    ) -> Result<reserva_core::domain::User, ReservaError> {
        match (&inbound.user_id, &inbound.phone) {
            (Some(_), Some(_)) | (None, None) => Err(ReservaError::validation(
                "user",
                "exactly one of user_id or phone is required",
            )),
            (Some(id), None) => users::find_by_id(&self.pool, *id)
                .await
                .map_err(map_persistence)?
                .ok_or_else(|| ReservaError::validation("user", "unknown user_id")),
            (None, Some(phone)) => users::find_or_create_by_phone(&self.pool, phone)
                .await
                .map_err(map_persistence),
        }
    }

    async fn classify(
        &self,
        company: &Company,
        conversation: &Conversation,
        normalized: &str,
        raw_message: &str,
    ) -> (IntentLabel, f32, Option<ExtractedData>) {
        let intentions = self.catalog.intentions_for(company.id);
        let system_keywords = self.catalog.system_keywords();

        let t1_timing = TierTiming::start("tier1");
        let t1 = self.keyword.detect(normalized, intentions, system_keywords);
        if let TierOneOutcome::Decided(candidate) = &t1 {
            t1_timing.record("decided");
            return (candidate.label, candidate.score, None);
        }
        t1_timing.record("undecided");

        let t1_best = match &t1 {
            TierOneOutcome::Undecided(candidates) => candidates.first().cloned(),
            _ => None,
        };
        let t1_score = t1_best.as_ref().map(|c| c.score);

        let t2_timing = TierTiming::start("tier2");
        let t2 = self.similarity.detect(normalized, intentions, t1_score);
        if let TierTwoOutcome::Decided(candidate) = &t2 {
            t2_timing.record("decided");
            return (candidate.label, candidate.score, None);
        }
        t2_timing.record("undecided");

        // Best candidate known so far, for the UpstreamUnavailable fallback
        // below (§4.F/§7): Tier 2's own best-but-below-threshold candidate
        // takes precedence since it folds in the Tier 1 score already,
        // otherwise fall back to Tier 1's.
        let best_known = match t2 {
            TierTwoOutcome::Undecided(Some(candidate)) => Some((candidate.label, candidate.score)),
            _ => t1_best.map(|c| (c.label, c.score)),
        };

        let t3_timing = TierTiming::start("tier3");
        let prompt = PromptBuilder::build(company, conversation, &recent_turns(raw_message), &[], raw_message);
        let outcome = tokio::time::timeout(TIER3_DEADLINE, self.llm.classify(&prompt)).await;

        match outcome {
            Ok(Ok(Tier3Outcome::Decided(response))) => {
                t3_timing.record("decided");
                let label = parse_intent_label(&response.intention);
                (label, response.confidence, Some(response.extracted_data))
            }
            Ok(Ok(Tier3Outcome::BreakerOpen)) => {
                t3_timing.record("breaker_open");
                fallback_to_best_known(best_known)
            }
            _ => {
                t3_timing.record("error");
                fallback_to_best_known(best_known)
            }
        }
    }

    /// Entry to the cancel list/select/confirm sub-flow (§4.M step 5,
    /// §8 scenario 6). A single active reservation still goes through the
    /// confirm step, just without a list to pick from first.
    async fn handle_cancel(
        &self,
        company: &Company,
        conversation: &mut Conversation,
    ) -> Result<String, ReservaError> {
        let candidates = reservations::list_active_by_user(&self.pool, company.id, conversation.user_id)
            .await
            .map_err(map_persistence)?;

        if candidates.is_empty() {
            return Ok("No encontré ninguna reserva activa para cancelar.".to_string());
        }

        if let [only] = candidates.as_slice() {
            return Ok(self.prompt_cancel_confirmation(conversation, only));
        }

        conversation.set_field(CANCEL_FLOW_FIELD, "select", 1.0);
        let list = candidates
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {} a las {} ({})", i + 1, r.date, r.time, r.service_key))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!(
            "Tienes varias reservas activas:\n{list}\n¿Cuál quieres cancelar? Responde con el número."
        ))
    }

    fn prompt_cancel_confirmation(&self, conversation: &mut Conversation, reservation: &Reservation) -> String {
        conversation.set_field(CANCEL_FLOW_FIELD, "confirm", 1.0);
        conversation.set_field(CANCEL_TARGET_FIELD, reservation.id.to_string(), 1.0);
        format!(
            "¿Confirmas que quieres cancelar la reserva del {} a las {}? (sí/no)",
            reservation.date, reservation.time
        )
    }

    /// Continues the cancel sub-flow once a selection/confirmation prompt
    /// is pending: parses the reply against whichever step is active and
    /// clears the bookkeeping fields once the sub-flow resolves.
    async fn handle_cancel_followup(
        &self,
        company: &Company,
        conversation: &mut Conversation,
        normalized: &str,
    ) -> Result<String, ReservaError> {
        let step = conversation.field(CANCEL_FLOW_FIELD).map(str::to_string);
        match step.as_deref() {
            Some("select") => {
                let candidates =
                    reservations::list_active_by_user(&self.pool, company.id, conversation.user_id)
                        .await
                        .map_err(map_persistence)?;
                if candidates.is_empty() {
                    conversation.collected.remove(CANCEL_FLOW_FIELD);
                    return Ok("Ya no tienes reservas activas para cancelar.".to_string());
                }
                let Some(index) = parse_selection_index(normalized) else {
                    return Ok(format!(
                        "No entendí tu selección. Responde con el número de la reserva que quieres cancelar (1-{}).",
                        candidates.len()
                    ));
                };
                let Some(chosen) = candidates.get(index) else {
                    return Ok(format!(
                        "Ese número no corresponde a ninguna reserva. Responde con un número entre 1 y {}.",
                        candidates.len()
                    ));
                };
                Ok(self.prompt_cancel_confirmation(conversation, chosen))
            }
            Some("confirm") => {
                let target = conversation
                    .field(CANCEL_TARGET_FIELD)
                    .and_then(|v| v.parse::<Uuid>().ok());
                conversation.collected.remove(CANCEL_FLOW_FIELD);
                conversation.collected.remove(CANCEL_TARGET_FIELD);

                let Some(target) = target else {
                    return Ok("No encontré la reserva seleccionada, intenta de nuevo.".to_string());
                };
                if !is_affirmative(normalized) {
                    return Ok("De acuerdo, no cancelé ninguna reserva.".to_string());
                }
                self.reservation_flow
                    .cancel_reservation(target, "user_requested")
                    .await?;
                if conversation.draft_reservation_id == Some(target) {
                    conversation.state = ConversationState::Cancelled;
                }
                Ok("Tu reserva fue cancelada.".to_string())
            }
            _ => {
                conversation.collected.remove(CANCEL_FLOW_FIELD);
                Ok("No entendí tu respuesta.".to_string())
            }
        }
    }

    async fn handle_consult(&self, company: &Company) -> Result<String, ReservaError> {
        let variants = products::list_service_variants(&self.pool, company.id)
            .await
            .map_err(map_persistence)?;
        if variants.is_empty() {
            return Ok("Por ahora no tengo servicios para mostrarte.".to_string());
        }
        let names: Vec<&str> = variants.iter().map(|p| p.name.as_str()).collect();
        Ok(format!("Estos son nuestros servicios: {}.", names.join(", ")))
    }

    async fn handle_greeting(
        &self,
        company: &Company,
        user: &reserva_core::domain::User,
    ) -> Result<String, ReservaError> {
        let prefs = user_preferences::find(&self.pool, user.id, company.id)
            .await
            .map_err(map_persistence)?;
        let returning = prefs.map(|p| p.is_returning_customer()).unwrap_or(false);
        Ok(if returning {
            format!("¡Hola de nuevo! Bienvenido otra vez a {}.", company.name)
        } else {
            format!("¡Hola! Bienvenido a {}, ¿en qué te puedo ayudar?", company.name)
        })
    }

    async fn handle_reservation_turn(
        &self,
        company: &Company,
        conversation: &mut Conversation,
    ) -> Result<String, ReservaError> {
        if conversation.state == ConversationState::Initial {
            conversation.state = ConversationState::Collecting;
        }

        let variants = products::list_service_variants(&self.pool, company.id)
            .await
            .map_err(map_persistence)?;
        let service_key = conversation.service_key.clone().unwrap_or_default();
        let variant = variants
            .iter()
            .find(|p| p.service_metadata().map(|m| m.service_key.as_str()) == Some(service_key.as_str()))
            .or_else(|| variants.first());

        let Some(variant) = variant else {
            return Ok("Aún no tenemos servicios configurados para reservar.".to_string());
        };

        let config = service_resolver::resolve(company, variant, &variants);
        let missing = field_validator::missing_fields(conversation, &config.validator);

        if !missing.is_empty() {
            let labels: Vec<&str> = missing
                .iter()
                .filter_map(|f| config.missing_field_labels.get(f).map(|s| s.as_str()))
                .collect();
            return Ok(format!(
                "Para continuar con tu {} necesito: {}.",
                config.reservation_noun,
                labels.join(", ")
            ));
        }

        self.commit_reservation(company, conversation, variant, &config)
            .await
    }

    async fn commit_reservation(
        &self,
        company: &Company,
        conversation: &mut Conversation,
        variant: &Product,
        config: &ServiceConfig,
    ) -> Result<String, ReservaError> {
        let items = self.resolve_items(conversation, variant).await?;
        let service_fee = 0;
        let total_price = reserva_core::domain::Reservation::compute_total(&items, service_fee);

        let date = conversation
            .field("date")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ReservaError::validation("date", "missing or unparsable"))?;
        let time = conversation
            .field("time")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ReservaError::validation("time", "missing or unparsable"))?;
        let guests = conversation.field("guests").and_then(|v| v.parse().ok());
        let phone = conversation
            .field("phone")
            .map(str::to_string)
            .ok_or_else(|| ReservaError::validation("phone", "missing"))?;
        let customer_name = conversation.field("name").map(str::to_string);

        if config.validator.requires_payment {
            conversation.state = ConversationState::AwaitingPayment;
            let payment = self
                .reservation_flow
                .request_payment(
                    conversation,
                    total_price,
                    format!("{} en {}", config.reservation_noun, company.name),
                    None,
                    customer_name,
                    self.payment_provider.as_ref(),
                )
                .await?;
            conversation.payment_reference = Some(payment.reference.clone());
            return Ok(format!(
                "Para confirmar tu {} necesitamos el pago: {}",
                config.reservation_noun,
                payment.checkout_url.unwrap_or_default()
            ));
        }

        let resource_id = self.resolve_resource(company, conversation).await?;
        let retry_budget = conversation.retries_remaining;

        match self
            .reservation_flow
            .confirm(
                conversation,
                items,
                variant
                    .service_metadata()
                    .map(|m| m.service_key.clone())
                    .unwrap_or_default(),
                phone,
                customer_name,
                resource_id,
                total_price,
                date,
                time,
                guests,
            )
            .await
        {
            Ok(reservation) => {
                conversation.state = ConversationState::Confirmed;
                conversation.draft_reservation_id = Some(reservation.id);
                Ok(format!(
                    "¡Tu {} quedó confirmada para el {} a las {}!",
                    config.reservation_noun, reservation.date, reservation.time
                ))
            }
            Err(e) if e.is_state_preserving() => {
                conversation.state = ConversationState::Collecting;
                conversation.retries_remaining = retry_budget.saturating_sub(1);
                Ok(format!(
                    "No pude completar tu {}: {e}. ¿Quieres intentar de nuevo?",
                    config.reservation_noun
                ))
            }
            Err(e) => {
                conversation.state = ConversationState::Collecting;
                conversation.retries_remaining = retry_budget.saturating_sub(1);
                Err(e)
            }
        }
    }

    async fn resolve_items(
        &self,
        conversation: &Conversation,
        variant: &Product,
    ) -> Result<Vec<ReservationItem>, ReservaError> {
        if conversation.draft_items.is_empty() {
            return Ok(vec![ReservationItem {
                product_id: variant.id,
                product_name: variant.name.clone(),
                quantity: 1,
                unit_price: variant.price,
            }]);
        }

        let mut items = Vec::with_capacity(conversation.draft_items.len());
        for draft in &conversation.draft_items {
            let product = products::find_by_id(&self.pool, draft.product_id)
                .await
                .map_err(map_persistence)?
                .ok_or_else(|| ReservaError::validation("products", "unknown product in draft"))?;
            items.push(ReservationItem {
                product_id: product.id,
                product_name: product.name,
                quantity: draft.quantity,
                unit_price: product.price,
            });
        }
        Ok(items)
    }

    async fn resolve_resource(
        &self,
        company: &Company,
        conversation: &Conversation,
    ) -> Result<Option<Uuid>, ReservaError> {
        let Some(guests) = conversation.field("guests").and_then(|v| v.parse::<u32>().ok()) else {
            return Ok(None);
        };
        let available = resources::list_available(&self.pool, company.id, "table", guests)
            .await
            .map_err(map_persistence)?;
        Ok(available.first().map(|r| r.id))
    }

    /// Picks `conversation.service_key` from the tenant's `ServiceKeyword`
    /// table when it hasn't already been set. Runs for every turn
    /// regardless of which tier decided the intent, so a Tier 1/2-decided
    /// turn (which never calls the LLM) still resolves the right service
    /// for a multi-service tenant instead of falling back to the first
    /// configured variant.
    fn resolve_service_key(&self, company: &Company, conversation: &mut Conversation, normalized: &str) {
        if conversation.service_key.is_some() {
            return;
        }
        let service_keywords = self.catalog.service_keywords_for(company.id);
        if let Some((service_key, _weight)) = self.keyword.detect_service(normalized, &service_keywords) {
            conversation.service_key = Some(service_key);
        }
    }

    /// Resolves product mentions into `conversation.draft_items`, combining
    /// the LLM tier's `extracted_data.products` hints (when it ran) with a
    /// scan of the normalized message against the tenant's catalog, so a
    /// `requiresProducts` service (e.g. delivery) can be satisfied even on
    /// a turn the tier cascade decided at Tier 1/2.
    async fn merge_draft_items(
        &self,
        company: &Company,
        conversation: &mut Conversation,
        normalized: &str,
        llm_hints: &[String],
    ) -> Result<(), ReservaError> {
        let catalog = products::list_by_company(&self.pool, company.id)
            .await
            .map_err(map_persistence)?;
        let sellable: Vec<Product> = catalog.into_iter().filter(|p| !p.is_service_variant()).collect();
        if sellable.is_empty() {
            return Ok(());
        }

        for found in match_products(normalized, llm_hints, &sellable) {
            if conversation.draft_items.iter().any(|d| d.product_id == found.product_id) {
                continue;
            }
            conversation.draft_items.push(DraftItem {
                product_id: found.product_id,
                quantity: found.quantity,
            });
        }
        Ok(())
    }
}

/// Parses the first whole number found in the message as a 1-based
/// selection index, returning it 0-based.
fn parse_selection_index(normalized: &str) -> Option<usize> {
    normalized
        .split_whitespace()
        .find_map(|tok| tok.parse::<usize>().ok())
        .map(|n| n.saturating_sub(1))
}

fn is_affirmative(normalized: &str) -> bool {
    const AFFIRMATIVE_WORDS: [&str; 6] = ["si", "claro", "confirmo", "dale", "afirmativo", "ok"];
    normalized.split_whitespace().any(|t| AFFIRMATIVE_WORDS.contains(&t))
}

/// Falls back to the best tier-1/2 candidate when Tier 3 is unavailable
/// (circuit open or call failed), instead of silently treating the
/// message as unrecognized.
fn fallback_to_best_known(best_known: Option<(IntentLabel, f32)>) -> (IntentLabel, f32, Option<ExtractedData>) {
    match best_known {
        Some((label, score)) => (label, score, None),
        None => (IntentLabel::Otro, 0.0, None),
    }
}

fn parse_intent_label(raw: &str) -> IntentLabel {
    match raw {
        "saludar" => IntentLabel::Saludar,
        "reservar" => IntentLabel::Reservar,
        "cancelar" => IntentLabel::Cancelar,
        "consultar" => IntentLabel::Consultar,
        "despedida" => IntentLabel::Despedida,
        _ => IntentLabel::Otro,
    }
}

fn recent_turns(raw_message: &str) -> Vec<RecentTurn> {
    vec![RecentTurn {
        speaker: "user",
        text: raw_message.to_string(),
    }]
}

/// Merges the deterministic extractor's entities into `collected`.
fn merge_entities(conversation: &mut Conversation, entities: &[Entity]) {
    for entity in entities {
        let field = match entity.entity_type {
            EntityType::Date => "date",
            EntityType::Time => "time",
            EntityType::Quantity => "guests",
            EntityType::Phone => "phone",
            EntityType::Email => continue,
            EntityType::Amount => continue,
            EntityType::Duration => continue,
        };
        conversation.set_field(field, entity.value.clone(), entity.confidence);
    }
}

/// Merges the Tier 3 model's structured extraction into `collected`. Only
/// fills fields the deterministic extractor left unset, since it ran this
/// same turn and takes precedence on overlap.
fn merge_extracted(conversation: &mut Conversation, extracted: ExtractedData) {
    const LLM_CONFIDENCE: f32 = 0.75;
    if conversation.field("date").is_none() {
        if let Some(date) = extracted.date {
            conversation.set_field("date", date, LLM_CONFIDENCE);
        }
    }
    if conversation.field("time").is_none() {
        if let Some(time) = extracted.time {
            conversation.set_field("time", time, LLM_CONFIDENCE);
        }
    }
    if conversation.field("guests").is_none() {
        if let Some(guests) = extracted.guests {
            conversation.set_field("guests", guests.to_string(), LLM_CONFIDENCE);
        }
    }
    if conversation.field("phone").is_none() {
        if let Some(phone) = extracted.phone {
            conversation.set_field("phone", phone, LLM_CONFIDENCE);
        }
    }
    if let Some(service) = extracted.service {
        if conversation.service_key.is_none() {
            conversation.service_key = Some(service);
        }
    }
}
