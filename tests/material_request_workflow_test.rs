// ==========================================
// 物料申领工作流集成测试
// ==========================================
// 测试范围:
// 1. 提交校验: 剧目存在、演员分配、重复待审批、明细合法
// 2. 状态路径: pending → approved → processing → prepared → collected
// 3. 领取人校验、重复迁移、驳回
// 4. 审计历史为合法子序列
// 5. prepare_from_approved 配置开关
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use helpers::test_data_builder::{costume_materials, single_material};
use theater_backoffice::api::RequestRef;
use theater_backoffice::config::config_keys;
use theater_backoffice::domain::types::{AssignmentStatus, MaterialRequestStatus};
use theater_backoffice::engine::MaterialRequestFlow;

// ==========================================
// 提交
// ==========================================

#[test]
fn test_submit_creates_pending_request() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");

    let request = env
        .material_request_api
        .submit(PLAY, ACTOR_A, costume_materials())
        .unwrap();

    assert_eq!(request.status, MaterialRequestStatus::Pending);
    assert_eq!(request.play_id, PLAY);
    assert_eq!(request.actor_id, ACTOR_A);
    assert_eq!(request.materials.len(), 2);
    assert_eq!(request.total_quantity(), 3);
    assert!(request.approved_at.is_none());

    let listed = env.material_request_api.list_by_play(PLAY).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(
        env.material_request_api.list_by_actor(ACTOR_A).unwrap().len(),
        1
    );
}

#[test]
fn test_submit_validation_errors() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let api = &env.material_request_api;

    let err = api.submit("no-such-play", ACTOR_A, costume_materials()).unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    env.add_actor("actor-c", "Actor C");
    let err = api.submit(PLAY, "actor-c", costume_materials()).unwrap_err();
    assert_eq!(err.code(), "NOT_ASSIGNED");

    let err = api.submit(PLAY, ACTOR_A, vec![]).unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");

    let err = api.submit(PLAY, ACTOR_A, single_material("  ", 1)).unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");

    let err = api.submit(PLAY, ACTOR_A, single_material("Wig", 0)).unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");

    // 以上失败均未落库
    assert!(api.list_by_play(PLAY).unwrap().is_empty());
}

#[test]
fn test_inactive_assignment_is_not_assigned() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    env.play_repo
        .set_assignment_status(PLAY, ACTOR_B, AssignmentStatus::Inactive)
        .unwrap();

    let err = env
        .material_request_api
        .submit(PLAY, ACTOR_B, costume_materials())
        .unwrap_err();
    assert_eq!(err.code(), "NOT_ASSIGNED");
}

#[test]
fn test_duplicate_pending_until_first_moves_on() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let api = &env.material_request_api;

    let first = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();
    let err = api.submit(PLAY, ACTOR_A, single_material("Lantern", 1)).unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_PENDING");

    // 其他演员不受影响
    api.submit(PLAY, ACTOR_B, single_material("Lantern", 1)).unwrap();

    // 第一笔离开 pending 后可再次提交
    api.approve(first.request_id.as_str(), PRODUCTION).unwrap();
    api.submit(PLAY, ACTOR_A, single_material("Lantern", 1)).unwrap();
}

// ==========================================
// 状态路径 (Scenario B)
// ==========================================

#[test]
fn test_full_path_and_collect_authorization() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let api = &env.material_request_api;

    let request = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();
    let id = request.request_id.as_str();

    let approved = api.approve(id, PRODUCTION).unwrap();
    assert_eq!(approved.status, MaterialRequestStatus::Approved);
    assert!(approved.approved_at.is_some());

    // 默认配置下不可跳过 processing
    let err = api.prepare(id, STORE).unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");

    let processing = api.mark_processing(id, STORE).unwrap();
    assert_eq!(processing.status, MaterialRequestStatus::Processing);
    assert!(processing.processing_at.is_some());

    let prepared = api.prepare(id, STORE).unwrap();
    assert_eq!(prepared.status, MaterialRequestStatus::Prepared);
    let stamp = prepared.prepared_by.clone().unwrap();
    assert_eq!(stamp.id, STORE);
    assert_eq!(stamp.name, format!("{} name", STORE));
    assert!(prepared.prepared_at.is_some());

    let collected = api.collect(id, ACTOR_A).unwrap();
    assert_eq!(collected.status, MaterialRequestStatus::Collected);
    assert!(collected.collected_at.is_some());

    // 另一位演员的已备好申领, 由 A 领取 → Unauthorized
    let other = api.submit(PLAY, ACTOR_B, single_material("Lantern", 2)).unwrap();
    let other_id = other.request_id.as_str();
    api.approve(other_id, PRODUCTION).unwrap();
    api.mark_processing(other_id, STORE).unwrap();
    api.prepare(other_id, STORE).unwrap();

    let err = api.collect(other_id, ACTOR_A).unwrap_err();
    assert_eq!(err.code(), "UNAUTHORIZED");
    assert_eq!(
        api.get_request(other_id).unwrap().status,
        MaterialRequestStatus::Prepared
    );
}

#[test]
fn test_collect_twice_is_invalid_transition() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let api = &env.material_request_api;

    let request = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();
    let id = request.request_id.as_str();
    api.approve(id, PRODUCTION).unwrap();
    api.mark_processing(id, STORE).unwrap();
    api.prepare(id, STORE).unwrap();
    api.collect(id, ACTOR_A).unwrap();

    let err = api.collect(id, ACTOR_A).unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");

    // 领取人不符时先报 Unauthorized
    let err = api.collect(id, ACTOR_B).unwrap_err();
    assert_eq!(err.code(), "UNAUTHORIZED");
}

#[test]
fn test_repeat_approve_is_invalid_transition() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let api = &env.material_request_api;

    let request = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();
    api.approve(request.request_id.as_str(), PRODUCTION).unwrap();
    let err = api.approve(request.request_id.as_str(), PRODUCTION).unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");
}

#[test]
fn test_reject_rules() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let api = &env.material_request_api;

    let pending = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();
    let rejected = api
        .reject(pending.request_id.as_str(), PRODUCTION, Some("Not in the script"))
        .unwrap();
    assert_eq!(rejected.status, MaterialRequestStatus::Rejected);
    assert!(rejected.rejected_at.is_some());
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Not in the script"));

    // processing 之后不可驳回
    let later = api.submit(PLAY, ACTOR_B, costume_materials()).unwrap();
    api.approve(later.request_id.as_str(), PRODUCTION).unwrap();
    api.mark_processing(later.request_id.as_str(), STORE).unwrap();
    let err = api.reject(later.request_id.as_str(), PRODUCTION, None).unwrap_err();
    assert_eq!(err.code(), "INVALID_TRANSITION");
}

#[test]
fn test_unknown_operator_is_not_found_and_nothing_changes() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let api = &env.material_request_api;

    let request = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();
    let err = api.approve(request.request_id.as_str(), "ghost").unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(
        api.get_request(request.request_id.as_str()).unwrap().status,
        MaterialRequestStatus::Pending
    );
}

// ==========================================
// 请求引用
// ==========================================

#[test]
fn test_request_ref_in_wrong_play_is_not_found() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    env.add_play("play-q", "Play Q");
    let api = &env.material_request_api;

    let request = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();

    let found = api
        .get_request(RequestRef::in_play(PLAY, &request.request_id))
        .unwrap();
    assert_eq!(found.request_id, request.request_id);

    let err = api
        .approve(RequestRef::in_play("play-q", &request.request_id), PRODUCTION)
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(
        api.get_request(request.request_id.as_str()).unwrap().status,
        MaterialRequestStatus::Pending
    );

    let approved = api
        .approve(RequestRef::in_play(PLAY, &request.request_id), PRODUCTION)
        .unwrap();
    assert_eq!(approved.status, MaterialRequestStatus::Approved);
}

// ==========================================
// 审计历史
// ==========================================

#[test]
fn test_history_is_legal_subsequence() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let api = &env.material_request_api;

    let request = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();
    let id = request.request_id.as_str();
    api.approve(id, PRODUCTION).unwrap();
    let _ = api.approve(id, PRODUCTION); // 失败的迁移不写历史
    api.mark_processing(id, STORE).unwrap();
    api.prepare(id, STORE).unwrap();
    api.collect(id, ACTOR_A).unwrap();

    let statuses = api.status_history(id).unwrap();
    assert_eq!(
        statuses,
        vec![
            MaterialRequestStatus::Pending,
            MaterialRequestStatus::Approved,
            MaterialRequestStatus::Processing,
            MaterialRequestStatus::Prepared,
            MaterialRequestStatus::Collected,
        ]
    );
    assert!(MaterialRequestFlow::new(false).is_legal_history(&statuses));

    let history = api.history(id).unwrap();
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].actor_id.as_deref(), Some(ACTOR_A));
    assert_eq!(history[3].actor_id.as_deref(), Some(STORE));
}

#[test]
fn test_rejected_history() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    let api = &env.material_request_api;

    let request = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();
    let id = request.request_id.as_str();
    api.approve(id, PRODUCTION).unwrap();
    api.reject(id, PRODUCTION, Some("Budget")).unwrap();

    let statuses = api.status_history(id).unwrap();
    assert_eq!(
        statuses,
        vec![
            MaterialRequestStatus::Pending,
            MaterialRequestStatus::Approved,
            MaterialRequestStatus::Rejected,
        ]
    );
    assert!(MaterialRequestFlow::new(false).is_legal_history(&statuses));
}

// ==========================================
// 配置开关
// ==========================================

#[test]
fn test_prepare_from_approved_flag() {
    let env = ApiTestEnv::seeded().expect("无法创建测试环境");
    env.config_manager
        .set_config_value(config_keys::PREPARE_FROM_APPROVED, "true")
        .unwrap();
    let api = &env.material_request_api;

    let request = api.submit(PLAY, ACTOR_A, costume_materials()).unwrap();
    let id = request.request_id.as_str();
    api.approve(id, PRODUCTION).unwrap();

    let prepared = api.prepare(id, STORE).unwrap();
    assert_eq!(prepared.status, MaterialRequestStatus::Prepared);
    assert!(prepared.processing_at.is_none());

    let statuses = api.status_history(id).unwrap();
    assert!(MaterialRequestFlow::new(true).is_legal_history(&statuses));
    assert!(!MaterialRequestFlow::new(false).is_legal_history(&statuses));
}
