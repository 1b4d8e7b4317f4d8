// ==========================================
// 采购订单与付款工作流集成测试
// ==========================================
// 测试范围:
// 1. 订单主路径与入库联动 (同事务)
// 2. 付款子流程: 提交 → 审批 → 处理 → 供应商确认
// 3. 撤销冲回库存、已付款不可撤销
// 4. 角色门控、删除规则
// ==========================================

mod helpers;

use rusqlite::params;

use helpers::api_test_helper::*;
use helpers::test_data_builder::OrderBuilder;
use theater_backoffice::domain::types::{OrderStatus, PaymentMethod, PaymentStatus};
use theater_backoffice::domain::{EntityType, PaymentDetailsEdit};

// ==========================================
// Scenario C: 主路径
// ==========================================

#[test]
fn test_order_to_confirmed_payment() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let item = env.add_item("Stage Lights", 3, 5);
    let orders = &env.order_api;

    let order = orders
        .create(
            OrderBuilder::new(5, 20.0)
                .for_item(&item.item_id)
                .supplied_by(SUPPLIER)
                .requested_by(STORE)
                .build(),
        )
        .unwrap();
    assert_eq!(order.total_cost, 100.0);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.requested_by.as_ref().map(|s| s.id.as_str()), Some(STORE));

    env.drive_order_to_delivered(&order.order_id);
    let delivered = orders.get_order(&order.order_id).unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.tracking_number.as_deref(), Some("TRK-001"));
    assert_eq!(env.stock_of(&item.item_id), 3);

    let received = orders.mark_received(&order.order_id, STORE).unwrap();
    assert_eq!(received.status, OrderStatus::PaymentPending);
    assert_eq!(received.payment.status, PaymentStatus::Pending);
    assert_eq!(env.stock_of(&item.item_id), 8);

    let submitted = orders
        .submit_payment(&order.order_id, STORE, None, None, None)
        .unwrap();
    assert_eq!(submitted.payment.status, PaymentStatus::Submitted);
    assert_eq!(submitted.payment.amount_paid, Some(100.0));
    assert_eq!(submitted.status, OrderStatus::Received);

    let paid = orders
        .process_payment(
            &order.order_id,
            FINANCE,
            Some(PaymentMethod::Cash),
            None,
            Some(100.0),
            None,
        )
        .unwrap();
    assert_eq!(paid.payment.status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(paid.payment.processed_by.as_ref().map(|s| s.id.as_str()), Some(FINANCE));

    let confirmed = orders
        .confirm_supplier_receipt(
            &order.order_id,
            SUPPLIER,
            Some("receipt-7781.pdf".to_string()),
            None,
        )
        .unwrap();
    assert!(confirmed.payment.supplier_confirmation);
    assert_eq!(confirmed.payment.status, PaymentStatus::Confirmed);
    assert!(confirmed.payment.confirmation_date.is_some());
    assert_eq!(confirmed.payment.confirmation_proof.as_deref(), Some("receipt-7781.pdf"));

    let err = orders
        .confirm_supplier_receipt(&order.order_id, SUPPLIER, None, None)
        .unwrap_err();
    assert_eq!(err.code(), "ALREADY_CONFIRMED");

    // 全过程审计
    let kinds: Vec<String> = env
        .dashboard_api
        .entity_history(EntityType::Order, &order.order_id)
        .unwrap()
        .into_iter()
        .map(|l| l.action_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            "CreateOrder",
            "ApproveOrder",
            "ProcessOrder",
            "DeliverOrder",
            "ReceiveOrder",
            "SubmitPayment",
            "ProcessPayment",
            "ConfirmSupplierReceipt",
        ]
    );
}

#[test]
fn test_approved_payment_path_and_not_yet_paid() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let orders = &env.order_api;
    let order = orders.create(OrderBuilder::new(2, 30.0).build()).unwrap();
    env.drive_order_to_received(&order.order_id);

    orders
        .submit_payment(
            &order.order_id,
            STORE,
            Some(PaymentMethod::BankTransfer),
            Some("BT-551".to_string()),
            None,
        )
        .unwrap();

    let err = orders
        .confirm_supplier_receipt(&order.order_id, ADMIN, None, None)
        .unwrap_err();
    assert_eq!(err.code(), "NOT_YET_PAID");

    let approved = orders.approve_payment(&order.order_id, FINANCE).unwrap();
    assert_eq!(approved.payment.status, PaymentStatus::Approved);
    assert_eq!(approved.status, OrderStatus::Received);

    let paid = orders
        .process_payment(&order.order_id, ADMIN, None, None, None, None)
        .unwrap();
    assert_eq!(paid.payment.method, Some(PaymentMethod::BankTransfer));
    assert_eq!(paid.payment.transaction_id.as_deref(), Some("BT-551"));
    assert_eq!(paid.payment.amount_paid, Some(60.0));
}

#[test]
fn test_submit_requires_payment_pending() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let orders = &env.order_api;
    let order = orders.create(OrderBuilder::new(1, 10.0).build()).unwrap();
    env.drive_order_to_delivered(&order.order_id);

    let err = orders
        .submit_payment(&order.order_id, STORE, None, None, None)
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");
}

// ==========================================
// 入库联动
// ==========================================

#[test]
fn test_free_text_order_credits_nothing() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let item = env.add_item("Gaffer tape", 4, 1);
    let order = env.order_api.create(OrderBuilder::new(6, 2.0).build()).unwrap();

    env.drive_order_to_received(&order.order_id);
    let received = env.order_api.get_order(&order.order_id).unwrap();
    assert!(!received.stock_credited);
    assert_eq!(env.stock_of(&item.item_id), 4);
}

#[test]
fn test_receive_is_all_or_nothing() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let item = env.add_item("Microphones", 2, 1);
    let order = env
        .order_api
        .create(OrderBuilder::new(3, 40.0).for_item(&item.item_id).build())
        .unwrap();
    env.drive_order_to_delivered(&order.order_id);

    // 物品被外部删除: 入库失败, 订单保持 Delivered
    let conn = rusqlite::Connection::open(&env.db_path).unwrap();
    conn.execute("DELETE FROM item WHERE item_id = ?1", params![item.item_id])
        .unwrap();
    drop(conn);

    let err = env.order_api.mark_received(&order.order_id, STORE).unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let after = env.order_api.get_order(&order.order_id).unwrap();
    assert_eq!(after.status, OrderStatus::Delivered);
    assert!(!after.stock_credited);
    assert_eq!(after.revision, order.revision + 3);

    let logs = env
        .dashboard_api
        .entity_history(EntityType::Order, &order.order_id)
        .unwrap();
    assert!(logs.iter().all(|l| l.action_type != "ReceiveOrder"));
}

// ==========================================
// Scenario D: 撤销
// ==========================================

#[test]
fn test_cancel_after_receive_reverses_stock() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let item = env.add_item("Speakers", 1, 1);
    let order = env
        .order_api
        .create(OrderBuilder::new(4, 50.0).for_item(&item.item_id).build())
        .unwrap();
    env.drive_order_to_received(&order.order_id);
    assert_eq!(env.stock_of(&item.item_id), 5);

    let cancelled = env
        .order_api
        .cancel(&order.order_id, ADMIN, Some("Wrong model"))
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(!cancelled.stock_credited);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Wrong model"));
    assert_eq!(env.stock_of(&item.item_id), 1);

    let err = env.order_api.cancel(&order.order_id, ADMIN, None).unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");
    assert_eq!(env.stock_of(&item.item_id), 1);
}

#[test]
fn test_cancel_aborts_when_stock_already_used() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let item = env.add_item("Makeup Kits", 0, 1);
    let order = env
        .order_api
        .create(OrderBuilder::new(5, 8.0).for_item(&item.item_id).build())
        .unwrap();
    env.drive_order_to_received(&order.order_id);
    env.inventory_api.debit(&item.item_id, 3).unwrap();

    let err = env.order_api.cancel(&order.order_id, ADMIN, None).unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_STOCK");

    let after = env.order_api.get_order(&order.order_id).unwrap();
    assert_eq!(after.status, OrderStatus::PaymentPending);
    assert!(after.stock_credited);
    assert_eq!(env.stock_of(&item.item_id), 2);
}

#[test]
fn test_cancel_mid_payment_closes_payment() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let orders = &env.order_api;

    let submitted = orders.create(OrderBuilder::new(2, 10.0).build()).unwrap();
    env.drive_order_to_received(&submitted.order_id);
    orders
        .submit_payment(&submitted.order_id, STORE, Some(PaymentMethod::Cash), None, None)
        .unwrap();

    let approved = orders.create(OrderBuilder::new(1, 30.0).build()).unwrap();
    env.drive_order_to_received(&approved.order_id);
    orders
        .submit_payment(&approved.order_id, STORE, Some(PaymentMethod::Cash), None, None)
        .unwrap();
    orders.approve_payment(&approved.order_id, FINANCE).unwrap();

    let cancelled = orders
        .cancel(&submitted.order_id, ADMIN, Some("Show postponed"))
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment.status, PaymentStatus::Cancelled);
    assert!(cancelled
        .payment
        .notes
        .as_deref()
        .is_some_and(|n| n.contains("Show postponed")));
    let cancelled = orders.cancel(&approved.order_id, ADMIN, None).unwrap();
    assert_eq!(cancelled.payment.status, PaymentStatus::Cancelled);

    // 财务汇总不再把撤销订单算作待处理付款
    let summary = env.dashboard_api.finance_summary().unwrap();
    for live in [PaymentStatus::Submitted, PaymentStatus::Approved] {
        let bucket = summary.by_payment_status[live.to_db_str()];
        assert_eq!(bucket.count, 0);
        assert_eq!(bucket.total_cost, 0.0);
    }
    let closed = summary.by_payment_status[PaymentStatus::Cancelled.to_db_str()];
    assert_eq!(closed.count, 2);
    assert_eq!(closed.total_cost, 50.0);
    assert_eq!(summary.paid.count, 0);

    assert!(env
        .dashboard_api
        .orders_by_status(None, Some(PaymentStatus::Submitted))
        .unwrap()
        .is_empty());
    assert!(env
        .dashboard_api
        .recent_payment_activity(None)
        .unwrap()
        .iter()
        .all(|o| o.status != OrderStatus::Cancelled));

    // 撤销后付款不可继续
    let err = orders.approve_payment(&submitted.order_id, FINANCE).unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");
    let err = orders
        .update_payment_details(
            &submitted.order_id,
            FINANCE,
            PaymentDetailsEdit {
                transaction_id: Some("TX-LATE".to_string()),
                ..PaymentDetailsEdit::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.code(), "BUSINESS_RULE_VIOLATION");
}

#[test]
fn test_paid_order_cannot_be_cancelled() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let item = env.add_item("Hair Wigs", 0, 1);
    let order = env
        .order_api
        .create(OrderBuilder::new(2, 15.0).for_item(&item.item_id).build())
        .unwrap();
    env.drive_order_to_received(&order.order_id);
    env.order_api
        .submit_payment(&order.order_id, STORE, Some(PaymentMethod::Cash), None, None)
        .unwrap();
    let paid = env
        .order_api
        .process_payment(&order.order_id, FINANCE, None, None, None, None)
        .unwrap();

    let err = env.order_api.cancel(&order.order_id, ADMIN, None).unwrap_err();
    assert_eq!(err.code(), "CANNOT_CANCEL_PAID");

    let after = env.order_api.get_order(&order.order_id).unwrap();
    assert_eq!(after.status, OrderStatus::Paid);
    assert_eq!(after.revision, paid.revision);
    assert_eq!(env.stock_of(&item.item_id), 2);
}

// ==========================================
// 角色门控
// ==========================================

#[test]
fn test_payment_actions_require_finance_role() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let orders = &env.order_api;
    let order = orders.create(OrderBuilder::new(1, 99.0).build()).unwrap();
    env.drive_order_to_received(&order.order_id);
    orders
        .submit_payment(&order.order_id, STORE, None, Some("TX-1".to_string()), None)
        .unwrap();

    for staff in [STORE, SUPPLIER, PRODUCTION] {
        assert_eq!(
            orders.approve_payment(&order.order_id, staff).unwrap_err().code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            orders
                .process_payment(&order.order_id, staff, None, None, None, None)
                .unwrap_err()
                .code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            orders
                .reject_payment(&order.order_id, staff, "no")
                .unwrap_err()
                .code(),
            "UNAUTHORIZED"
        );
    }

    // 停用的财务人员同样无权
    assert_eq!(
        orders.approve_payment(&order.order_id, RETIRED).unwrap_err().code(),
        "UNAUTHORIZED"
    );
    assert_eq!(
        orders.approve_payment(&order.order_id, "ghost").unwrap_err().code(),
        "NOT_FOUND"
    );
    assert_eq!(
        orders.get_order(&order.order_id).unwrap().payment.status,
        PaymentStatus::Submitted
    );
}

#[test]
fn test_supplier_confirmation_authorization() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let orders = &env.order_api;
    let order = orders
        .create(OrderBuilder::new(1, 10.0).supplied_by(SUPPLIER).build())
        .unwrap();
    env.drive_order_to_received(&order.order_id);
    orders
        .submit_payment(&order.order_id, STORE, Some(PaymentMethod::Cash), None, None)
        .unwrap();
    orders
        .process_payment(&order.order_id, FINANCE, None, None, None, None)
        .unwrap();

    let err = orders
        .confirm_supplier_receipt(&order.order_id, OTHER_SUPPLIER, None, None)
        .unwrap_err();
    assert_eq!(err.code(), "UNAUTHORIZED");

    let err = orders
        .confirm_supplier_receipt(&order.order_id, FINANCE, None, None)
        .unwrap_err();
    assert_eq!(err.code(), "UNAUTHORIZED");

    let confirmed = orders
        .confirm_supplier_receipt(&order.order_id, ADMIN, None, Some("Confirmed by phone".to_string()))
        .unwrap();
    assert_eq!(confirmed.payment.confirmed_by.as_ref().map(|s| s.id.as_str()), Some(ADMIN));
}

#[test]
fn test_reject_payment_keeps_order_received() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let orders = &env.order_api;
    let order = orders.create(OrderBuilder::new(3, 5.0).build()).unwrap();
    env.drive_order_to_received(&order.order_id);
    orders
        .submit_payment(&order.order_id, STORE, None, Some("TX-2".to_string()), None)
        .unwrap();

    let rejected = orders
        .reject_payment(&order.order_id, FINANCE, "Duplicate invoice")
        .unwrap();
    assert_eq!(rejected.status, OrderStatus::Received);
    assert_eq!(rejected.payment.status, PaymentStatus::Rejected);

    // 驳回后不可再处理, 但可修正付款信息
    let err = orders
        .process_payment(&order.order_id, FINANCE, None, None, None, None)
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");

    let edited = orders
        .update_payment_details(
            &order.order_id,
            STORE,
            PaymentDetailsEdit {
                transaction_id: Some("TX-3".to_string()),
                ..PaymentDetailsEdit::default()
            },
        )
        .unwrap();
    assert_eq!(edited.payment.transaction_id.as_deref(), Some("TX-3"));
}

// ==========================================
// 删除与编辑
// ==========================================

#[test]
fn test_delete_forbidden_statuses() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let orders = &env.order_api;

    let approved = orders.create(OrderBuilder::new(1, 1.0).build()).unwrap();
    orders.approve(&approved.order_id, ADMIN).unwrap();
    assert_eq!(
        orders.delete(&approved.order_id, ADMIN).unwrap_err().code(),
        "BUSINESS_RULE_VIOLATION"
    );

    let delivered = orders.create(OrderBuilder::new(1, 1.0).build()).unwrap();
    env.drive_order_to_delivered(&delivered.order_id);
    assert_eq!(
        orders.delete(&delivered.order_id, ADMIN).unwrap_err().code(),
        "BUSINESS_RULE_VIOLATION"
    );

    // Processing 与 Rejected 可删除
    let processing = orders.create(OrderBuilder::new(1, 1.0).build()).unwrap();
    orders.approve(&processing.order_id, ADMIN).unwrap();
    orders.mark_processing(&processing.order_id, STORE).unwrap();
    orders.delete(&processing.order_id, ADMIN).unwrap();

    let rejected = orders.create(OrderBuilder::new(1, 1.0).build()).unwrap();
    orders.reject(&rejected.order_id, ADMIN, Some("Over budget")).unwrap();
    orders.delete(&rejected.order_id, ADMIN).unwrap();

    assert_eq!(
        orders.get_order(&processing.order_id).unwrap_err().code(),
        "NOT_FOUND"
    );
    assert!(orders.get_order(&approved.order_id).is_ok());
}

#[test]
fn test_total_cost_invariant_across_edits() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let orders = &env.order_api;
    let order = orders.create(OrderBuilder::new(3, 7.5).build()).unwrap();

    let edited = orders
        .update_order(
            &order.order_id,
            ADMIN,
            theater_backoffice::domain::OrderEdit {
                quantity: Some(4),
                unit_price: Some(2.5),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(edited.total_cost, edited.quantity as f64 * edited.unit_price);
    assert_eq!(edited.total_cost, 10.0);

    for bad in [
        OrderBuilder::new(0, 1.0).build(),
        OrderBuilder::new(1, 0.0).build(),
    ] {
        assert_eq!(orders.create(bad).unwrap_err().code(), "INVALID_INPUT");
    }
}

#[test]
fn test_list_orders_for_supplier() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let orders = &env.order_api;
    orders
        .create(OrderBuilder::new(1, 1.0).supplied_by(SUPPLIER).build())
        .unwrap();
    orders.create(OrderBuilder::new(1, 1.0).build()).unwrap();

    assert_eq!(orders.list_orders_for_supplier(SUPPLIER).unwrap().len(), 1);
    assert_eq!(
        orders.list_orders_for_supplier("Stage Supplies Ltd").unwrap().len(),
        2
    );
    assert_eq!(
        orders.list_orders_for_supplier(" ").unwrap_err().code(),
        "INVALID_INPUT"
    );
}
