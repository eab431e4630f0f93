//! Order status workflow over HTTP

mod harness;

use axum::http::StatusCode;
use futures::future::join_all;
use harness::*;
use serde_json::{Value, json};
use uuid::Uuid;

/// A restaurant with one order from a fresh customer
struct Scene {
    h: Harness,
    owner: Actor,
    customer: Actor,
    order_id: Uuid,
}

async fn scene() -> Scene {
    let h = harness();
    let (owner, restaurant) = h.seed_restaurant("Spice Route").await;
    let dish = h.seed_dish(&restaurant, "Thali", 100).await;
    let customer = Actor::customer();

    let body: Value = h
        .server
        .post("/api/orders")
        .as_actor(&customer)
        .json(&json!({
            "orderItems": [{ "dish": dish.id, "qty": 1 }],
            "deliveryAddress": address(),
            "paymentMethod": "cod"
        }))
        .await
        .json();
    let order_id = body["id"].as_str().unwrap().parse().unwrap();

    Scene {
        h,
        owner,
        customer,
        order_id,
    }
}

impl Scene {
    async fn set_status(&self, actor: &Actor, status: &str) -> axum_test::TestResponse {
        self.h
            .server
            .put(&format!("/api/orders/{}/status", self.order_id))
            .as_actor(actor)
            .json(&json!({ "orderStatus": status }))
            .await
    }

    async fn advance_to_ready(&self) {
        self.set_status(&self.owner, "preparing")
            .await
            .assert_status_ok();
        self.set_status(&self.owner, "ready").await.assert_status_ok();
    }
}

mod happy_path_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_delivery_flow() {
        let s = scene().await;
        let partner = Actor::partner();

        s.advance_to_ready().await;

        let response = s.set_status(&partner, "on-the-way").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["orderStatus"], "on-the-way");
        assert_eq!(body["deliveryPartner"], partner.id.to_string());

        let response = s.set_status(&partner, "delivered").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["orderStatus"], "delivered");
    }

    #[tokio::test]
    async fn test_legacy_status_field_is_accepted() {
        let s = scene().await;
        let response = s
            .h
            .server
            .put(&format!("/api/orders/{}/status", s.order_id))
            .as_actor(&s.owner)
            .json(&json!({ "status": "preparing" }))
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_same_status_is_a_no_op() {
        let s = scene().await;
        let response = s.set_status(&s.customer, "pending").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["orderStatus"], "pending");
    }

    #[tokio::test]
    async fn test_customer_can_cancel_before_pickup() {
        let s = scene().await;
        let response = s.set_status(&s.customer, "cancelled").await;
        response.assert_status_ok();

        let response = s.set_status(&s.owner, "preparing").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_TRANSITION");
    }
}

mod rejection_tests {
    use super::*;

    #[tokio::test]
    async fn test_skipping_a_step_is_invalid() {
        let s = scene().await;
        let response = s.set_status(&s.owner, "ready").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_TRANSITION");
        assert_eq!(body["details"]["from"], "pending");
        assert_eq!(body["details"]["to"], "ready");
    }

    #[tokio::test]
    async fn test_unknown_status_is_rejected() {
        let s = scene().await;
        let response = s.set_status(&s.owner, "teleported").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "UNKNOWN_STATUS");
    }

    #[tokio::test]
    async fn test_customer_cannot_prepare() {
        let s = scene().await;
        let response = s.set_status(&s.customer, "preparing").await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_foreign_restaurant_cannot_prepare() {
        let s = scene().await;
        let (other_owner, _) = s.h.seed_restaurant("Elsewhere").await;
        let response = s.set_status(&other_owner, "preparing").await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_only_assigned_partner_delivers() {
        let s = scene().await;
        s.advance_to_ready().await;
        let partner = Actor::partner();
        s.set_status(&partner, "on-the-way").await.assert_status_ok();

        let response = s.set_status(&Actor::partner(), "delivered").await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_no_cancel_after_pickup() {
        let s = scene().await;
        s.advance_to_ready().await;
        s.set_status(&Actor::partner(), "on-the-way")
            .await
            .assert_status_ok();

        let response = s.set_status(&s.customer, "cancelled").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let s = scene().await;
        let response = s
            .h
            .server
            .put(&format!("/api/orders/{}/status", Uuid::new_v4()))
            .as_actor(&s.owner)
            .json(&json!({ "orderStatus": "preparing" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

mod visibility_tests {
    use super::*;

    #[tokio::test]
    async fn test_partner_board_shows_ready_and_own_orders() {
        let s = scene().await;
        let partner = Actor::partner();

        let board: Vec<Value> = s
            .h
            .server
            .get("/api/orders/deliverypartner")
            .as_actor(&partner)
            .await
            .json();
        assert!(board.is_empty());

        s.advance_to_ready().await;
        let board: Vec<Value> = s
            .h
            .server
            .get("/api/orders/deliverypartner")
            .as_actor(&partner)
            .await
            .json();
        assert_eq!(board.len(), 1);

        s.set_status(&partner, "on-the-way").await.assert_status_ok();
        let other: Vec<Value> = s
            .h
            .server
            .get("/api/orders/deliverypartner")
            .as_actor(&Actor::partner())
            .await
            .json();
        assert!(other.is_empty());

        let own: Vec<Value> = s
            .h
            .server
            .get("/api/orders/deliverypartner")
            .as_actor(&partner)
            .await
            .json();
        assert_eq!(own.len(), 1);
    }

    #[tokio::test]
    async fn test_partner_board_requires_delivery_role() {
        let s = scene().await;
        let response = s
            .h
            .server
            .get("/api/orders/deliverypartner")
            .as_actor(&s.customer)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_order_detail_visibility() {
        let s = scene().await;
        let path = format!("/api/orders/{}", s.order_id);

        s.h.server
            .get(&path)
            .as_actor(&s.customer)
            .await
            .assert_status_ok();
        s.h.server
            .get(&path)
            .as_actor(&s.owner)
            .await
            .assert_status_ok();
        s.h.server
            .get(&path)
            .as_actor(&Actor::admin())
            .await
            .assert_status_ok();
        s.h.server
            .get(&path)
            .as_actor(&Actor::customer())
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_my_orders_and_admin_listing() {
        let s = scene().await;

        let mine: Vec<Value> = s
            .h
            .server
            .get("/api/orders/myorders")
            .as_actor(&s.customer)
            .await
            .json();
        assert_eq!(mine.len(), 1);

        let none: Vec<Value> = s
            .h
            .server
            .get("/api/orders/myorders")
            .as_actor(&Actor::customer())
            .await
            .json();
        assert!(none.is_empty());

        s.h.server
            .get("/api/orders/all")
            .as_actor(&s.customer)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        let all: Vec<Value> = s
            .h
            .server
            .get("/api/orders/all")
            .as_actor(&Actor::admin())
            .await
            .json();
        assert_eq!(all.len(), 1);
    }
}

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_assign_one_partner() {
        let s = scene().await;
        s.advance_to_ready().await;

        let partners: Vec<Actor> = (0..8).map(|_| Actor::partner()).collect();
        let attempts = partners.iter().map(|p| s.set_status(p, "on-the-way"));
        let responses = join_all(attempts).await;

        let stored = s.h.storage.orders.get(&s.order_id).await.unwrap().unwrap();
        let winner = stored.delivery_partner.expect("one partner is assigned");
        assert!(partners.iter().any(|p| p.id == winner));

        let mut successes = 0;
        for response in responses {
            let status = response.status_code();
            if status == StatusCode::OK {
                successes += 1;
                let body: Value = response.json();
                assert_eq!(body["deliveryPartner"], winner.to_string());
            } else {
                assert_eq!(status, StatusCode::CONFLICT);
            }
        }
        assert!(successes >= 1);
    }
}
