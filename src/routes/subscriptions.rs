use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    ErrorResponse, PaymentStatus, SubscriptionNotice, SubscriptionNoticeRequest,
    SubscriptionNoticeResponse, UserKind,
};
use crate::routes::search::{internal_error, validation_failed, AppState};

/// Configure subscription tracking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/subscriptions/notify", web::post().to(record_notice));
}

/// Record subscription notice endpoint
///
/// POST /api/v1/subscriptions/notify
///
/// Request body:
/// ```json
/// {
///   "txnId": "4E7...",
///   "payerEmail": "famille@example.org",
///   "amount": 9.9,
///   "paymentStatus": "completed|pending|failed|refunded",
///   "nextPaymentDate": "2024-07-01T00:00:00Z",
///   "profileKind": "famille",
///   "profileId": 1
/// }
/// ```
///
/// A completed notice also moves the profile to the premium plan until
/// `nextPaymentDate`. The notice itself is always kept for auditing.
async fn record_notice(
    state: web::Data<AppState>,
    req: web::Json<SubscriptionNoticeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let payment_status = match PaymentStatus::parse(&req.payment_status) {
        Some(status) => status,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid payment status".to_string(),
                message: "Payment status must be one of: completed, pending, failed, refunded"
                    .to_string(),
                status_code: 400,
            });
        }
    };

    let profile_kind = match UserKind::from_str(&req.profile_kind) {
        Some(kind) => kind,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid profile kind".to_string(),
                message: "profileKind must be famille or prestataire".to_string(),
                status_code: 400,
            });
        }
    };

    let notice = SubscriptionNotice {
        id: uuid::Uuid::new_v4(),
        txn_id: req.txn_id.clone(),
        subscr_id: req.subscr_id.clone(),
        payer_email: req.payer_email.clone(),
        amount: req.amount,
        currency: req.currency.clone(),
        payment_status,
        next_payment_date: req.next_payment_date,
        profile_kind,
        profile_id: req.profile_id,
        created_at: chrono::Utc::now(),
    };

    if let Err(e) = state.postgres.record_subscription_notice(&notice).await {
        tracing::error!("Failed to record subscription notice: {}", e);
        return internal_error("Failed to record subscription notice", e);
    }

    let plan_upgraded = if payment_status == PaymentStatus::Completed {
        match state
            .postgres
            .upgrade_plan(profile_kind, req.profile_id, req.next_payment_date)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(
                    "Subscription notice {} names unknown {} {}",
                    notice.txn_id,
                    profile_kind.as_str(),
                    req.profile_id
                );
                false
            }
            Err(e) => {
                // The notice is recorded; the upgrade can be replayed
                tracing::error!("Failed to upgrade plan: {}", e);
                return internal_error("Failed to upgrade plan", e);
            }
        }
    } else {
        false
    };

    tracing::info!(
        "Recorded subscription notice {} ({:?}) for {} {}",
        notice.txn_id,
        payment_status,
        profile_kind.as_str(),
        req.profile_id
    );

    HttpResponse::Ok().json(SubscriptionNoticeResponse {
        success: true,
        notice_id: notice.id.to_string(),
        plan_upgraded,
    })
}
