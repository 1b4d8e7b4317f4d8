// ==========================================
// 剧院制作后台 - 物料申领工作流 API
// ==========================================
// 职责: 演员提交申领 → 审批 → 处理 → 备好 → 领取 / 驳回
// 红线: 状态迁移由 MaterialRequestFlow 判定; 状态写入与审计日志同事务
// 权威存储: material_request 表 (剧目视图仅为只读投影)
// ==========================================

use std::sync::Arc;

use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::IdentityResolver;
use crate::api::validator;
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType, EntityType};
use crate::domain::material_request::{MaterialLine, MaterialRequest};
use crate::domain::staff::IdentityStamp;
use crate::domain::types::MaterialRequestStatus;
use crate::engine::material_flow::{MaterialRequestAction, MaterialRequestFlow};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::material_request_repo::MaterialRequestRepository;
use crate::repository::play_repo::PlayRepository;
use crate::repository::unit_of_work::UnitOfWork;

// ==========================================
// RequestRef - 申领引用
// ==========================================
/// 裸申领ID, 或 (剧目ID, 申领ID) 组合
///
/// 组合形式下申领不属于该剧目时按不存在处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRef<'a> {
    Id(&'a str),
    InPlay { play_id: &'a str, request_id: &'a str },
}

impl<'a> RequestRef<'a> {
    pub fn in_play(play_id: &'a str, request_id: &'a str) -> Self {
        RequestRef::InPlay { play_id, request_id }
    }

    pub fn request_id(&self) -> &'a str {
        match self {
            RequestRef::Id(id) => id,
            RequestRef::InPlay { request_id, .. } => request_id,
        }
    }
}

impl<'a> From<&'a str> for RequestRef<'a> {
    fn from(request_id: &'a str) -> Self {
        RequestRef::Id(request_id)
    }
}

/// 迁移执行人
enum Performer<'a> {
    Staff(&'a IdentityStamp),
    Actor(&'a str),
}

// ==========================================
// MaterialRequestApi
// ==========================================
pub struct MaterialRequestApi {
    request_repo: Arc<MaterialRequestRepository>,
    play_repo: Arc<PlayRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    identity: Arc<dyn IdentityResolver>,
    config: Arc<ConfigManager>,
    uow: Arc<UnitOfWork>,
}

impl MaterialRequestApi {
    pub fn new(
        request_repo: Arc<MaterialRequestRepository>,
        play_repo: Arc<PlayRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        identity: Arc<dyn IdentityResolver>,
        config: Arc<ConfigManager>,
        uow: Arc<UnitOfWork>,
    ) -> Self {
        Self {
            request_repo,
            play_repo,
            action_log_repo,
            identity,
            config,
            uow,
        }
    }

    // ==========================================
    // 提交
    // ==========================================

    /// 演员提交物料申领
    ///
    /// # 参数
    /// - `play_id`: 剧目ID
    /// - `actor_id`: 申领演员ID
    /// - `materials`: 物料明细 (非空, 名称非空, 数量 >= 1)
    ///
    /// # 返回
    /// - `Ok(MaterialRequest)`: 新申领 (pending)
    /// - `Err(NotFound)`: 剧目不存在
    /// - `Err(NotAssigned)`: 演员未有效分配到该剧目
    /// - `Err(DuplicatePending)`: 已有待审批申领
    /// - `Err(InvalidInput)`: 明细不合法
    pub fn submit(
        &self,
        play_id: &str,
        actor_id: &str,
        materials: Vec<MaterialLine>,
    ) -> ApiResult<MaterialRequest> {
        self.submit_with_notes(play_id, actor_id, materials, None)
    }

    /// 提交申领 (附备注)
    pub fn submit_with_notes(
        &self,
        play_id: &str,
        actor_id: &str,
        materials: Vec<MaterialLine>,
        notes: Option<String>,
    ) -> ApiResult<MaterialRequest> {
        validator::validate_materials(&materials)?;

        let request = self.uow.run(|tx| {
            let conn: &Connection = tx;

            if PlayRepository::find_by_id_in(conn, play_id)?.is_none() {
                return Err(ApiError::NotFound(format!("剧目(id={})不存在", play_id)));
            }
            if PlayRepository::find_active_assignment_in(conn, play_id, actor_id)?.is_none() {
                return Err(ApiError::NotAssigned {
                    play_id: play_id.to_string(),
                    actor_id: actor_id.to_string(),
                });
            }
            if MaterialRequestRepository::has_pending_in(conn, play_id, actor_id)? {
                return Err(ApiError::DuplicatePending {
                    play_id: play_id.to_string(),
                    actor_id: actor_id.to_string(),
                });
            }

            let now = chrono::Utc::now().naive_utc();
            let request = MaterialRequest {
                request_id: uuid::Uuid::new_v4().to_string(),
                play_id: play_id.to_string(),
                actor_id: actor_id.to_string(),
                materials,
                status: MaterialRequestStatus::Pending,
                notes,
                requested_at: now,
                approved_at: None,
                processing_at: None,
                prepared_at: None,
                collected_at: None,
                rejected_at: None,
                prepared_by: None,
                rejection_reason: None,
                updated_at: now,
                revision: 1,
            };

            MaterialRequestRepository::insert_in(conn, &request)?;
            ActionLogRepository::insert_in(
                conn,
                &ActionLog::new(
                    EntityType::MaterialRequest,
                    &request.request_id,
                    ActionType::SubmitRequest,
                )
                .by_actor_id(actor_id)
                .with_payload(&json!({
                    "to": MaterialRequestStatus::Pending.to_db_str(),
                    "play_id": play_id,
                    "materials": request.materials,
                })),
            )?;
            Ok(request)
        })?;

        info!(
            request_id = %request.request_id,
            play_id = %play_id,
            actor_id = %actor_id,
            lines = request.materials.len(),
            "物料申领已提交"
        );
        Ok(request)
    }

    // ==========================================
    // 状态迁移
    // ==========================================

    /// 审批: pending → approved
    pub fn approve<'a>(
        &self,
        request: impl Into<RequestRef<'a>>,
        operator_id: &str,
    ) -> ApiResult<MaterialRequest> {
        let stamp = self.identity.resolve(operator_id)?;
        self.apply(
            request.into(),
            MaterialRequestAction::Approve,
            ActionType::ApproveRequest,
            Performer::Staff(&stamp),
            |_| Ok(()),
            |_| {},
        )
    }

    /// 开始处理: approved → processing
    pub fn mark_processing<'a>(
        &self,
        request: impl Into<RequestRef<'a>>,
        operator_id: &str,
    ) -> ApiResult<MaterialRequest> {
        let stamp = self.identity.resolve(operator_id)?;
        self.apply(
            request.into(),
            MaterialRequestAction::MarkProcessing,
            ActionType::ProcessRequest,
            Performer::Staff(&stamp),
            |_| Ok(()),
            |_| {},
        )
    }

    /// 备好: processing → prepared (开关开启时亦允许 approved → prepared)
    ///
    /// prepared_by 写入操作发生时解析出的身份戳
    pub fn prepare<'a>(
        &self,
        request: impl Into<RequestRef<'a>>,
        preparer_id: &str,
    ) -> ApiResult<MaterialRequest> {
        let stamp = self.identity.resolve(preparer_id)?;
        let prepared_by = stamp.clone();
        self.apply(
            request.into(),
            MaterialRequestAction::Prepare,
            ActionType::PrepareRequest,
            Performer::Staff(&stamp),
            |_| Ok(()),
            move |req| req.prepared_by = Some(prepared_by),
        )
    }

    /// 领取: prepared → collected
    ///
    /// 先校验领取人与申领演员一致, 再校验状态
    pub fn collect<'a>(
        &self,
        request: impl Into<RequestRef<'a>>,
        actor_id: &str,
    ) -> ApiResult<MaterialRequest> {
        self.apply(
            request.into(),
            MaterialRequestAction::Collect,
            ActionType::CollectRequest,
            Performer::Actor(actor_id),
            |req| {
                if req.actor_id != actor_id {
                    return Err(ApiError::Unauthorized(format!(
                        "申领(id={})属于演员{}, 领取人为{}",
                        req.request_id, req.actor_id, actor_id
                    )));
                }
                Ok(())
            },
            |_| {},
        )
    }

    /// 驳回: pending / approved → rejected
    pub fn reject<'a>(
        &self,
        request: impl Into<RequestRef<'a>>,
        operator_id: &str,
        reason: Option<&str>,
    ) -> ApiResult<MaterialRequest> {
        let stamp = self.identity.resolve(operator_id)?;
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        self.apply(
            request.into(),
            MaterialRequestAction::Reject,
            ActionType::RejectRequest,
            Performer::Staff(&stamp),
            |_| Ok(()),
            move |req| req.rejection_reason = reason,
        )
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_request<'a>(&self, request: impl Into<RequestRef<'a>>) -> ApiResult<MaterialRequest> {
        let request = request.into();
        self.uow.read(|conn| Self::load_in(conn, request))
    }

    /// 剧目下全部申领 (按提交时间倒序)
    pub fn list_by_play(&self, play_id: &str) -> ApiResult<Vec<MaterialRequest>> {
        if self.play_repo.find_by_id(play_id)?.is_none() {
            return Err(ApiError::NotFound(format!("剧目(id={})不存在", play_id)));
        }
        Ok(self.request_repo.list_by_play(play_id)?)
    }

    pub fn list_by_actor(&self, actor_id: &str) -> ApiResult<Vec<MaterialRequest>> {
        Ok(self.request_repo.list_by_actor(actor_id)?)
    }

    /// 申领审计历史 (按发生顺序)
    pub fn history(&self, request_id: &str) -> ApiResult<Vec<ActionLog>> {
        if self.request_repo.find_by_id(request_id)?.is_none() {
            return Err(ApiError::NotFound(format!("物料申领(id={})不存在", request_id)));
        }
        Ok(self
            .action_log_repo
            .find_by_entity(EntityType::MaterialRequest, request_id)?)
    }

    /// 申领经历过的状态序列 (由审计历史还原)
    pub fn status_history(&self, request_id: &str) -> ApiResult<Vec<MaterialRequestStatus>> {
        Ok(self
            .history(request_id)?
            .iter()
            .filter_map(|log| log.target_status())
            .filter_map(MaterialRequestStatus::from_str)
            .collect())
    }

    // ==========================================
    // 内部
    // ==========================================

    fn flow(&self) -> ApiResult<MaterialRequestFlow> {
        let config = self
            .config
            .load_workflow_config()
            .map_err(ApiError::config_read)?;
        Ok(MaterialRequestFlow::new(config.prepare_from_approved))
    }

    fn load_in(conn: &Connection, request: RequestRef<'_>) -> ApiResult<MaterialRequest> {
        let request_id = request.request_id();
        let found = MaterialRequestRepository::find_by_id_in(conn, request_id)?;

        match (found, request) {
            (Some(req), RequestRef::InPlay { play_id, .. }) if req.play_id != play_id => {
                Err(ApiError::NotFound(format!(
                    "剧目(id={})下不存在物料申领(id={})",
                    play_id, request_id
                )))
            }
            (Some(req), _) => Ok(req),
            (None, _) => Err(ApiError::NotFound(format!(
                "物料申领(id={})不存在",
                request_id
            ))),
        }
    }

    /// 执行一次状态迁移
    ///
    /// 顺序: 读取 → guard (权限) → 迁移表判定 → mutate → 条件写回 → 审计
    fn apply<G, M>(
        &self,
        request: RequestRef<'_>,
        action: MaterialRequestAction,
        action_type: ActionType,
        performer: Performer<'_>,
        guard: G,
        mutate: M,
    ) -> ApiResult<MaterialRequest>
    where
        G: FnOnce(&MaterialRequest) -> ApiResult<()>,
        M: FnOnce(&mut MaterialRequest),
    {
        let flow = self.flow()?;

        self.uow.run(|tx| {
            let conn: &Connection = tx;
            let mut req = Self::load_in(conn, request)?;
            guard(&req)?;

            let from = req.status;
            let to = flow.apply(from, action)?;

            let now = chrono::Utc::now().naive_utc();
            req.enter(to, now);
            mutate(&mut req);
            req.revision = MaterialRequestRepository::update_in(conn, &req)?;

            let log = ActionLog::new(EntityType::MaterialRequest, &req.request_id, action_type)
                .with_transition(from.to_db_str(), to.to_db_str());
            let log = match performer {
                Performer::Staff(stamp) => log.by(stamp),
                Performer::Actor(actor_id) => log.by_actor_id(actor_id),
            };
            let log = match req.rejection_reason.as_deref() {
                Some(reason) if to == MaterialRequestStatus::Rejected => log.with_detail(reason),
                _ => log,
            };
            ActionLogRepository::insert_in(conn, &log)?;

            info!(
                request_id = %req.request_id,
                from = %from,
                to = %to,
                "物料申领状态迁移"
            );
            Ok(req)
        })
    }
}
