// ==========================================
// 剧院制作后台 - 工作流查询 API (看板)
// ==========================================
// 职责: 物料申领统计、剧目视图投影、订单筛选、财务汇总、审计查询
// 红线: 只读, 不产生任何写入
// 说明: 演员/剧目名称为可选信息, 关联记录已删除时仍按ID返回
// ==========================================

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, EntityType};
use crate::domain::material_request::MaterialRequest;
use crate::domain::order::Order;
use crate::domain::play::Play;
use crate::domain::types::{MaterialRequestStatus, OrderStatus, PaymentStatus};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::material_request_repo::MaterialRequestRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::play_repo::{ActorRepository, PlayRepository};

// ==========================================
// 看板 DTO
// ==========================================

/// 物料申领统计 (全部状态补零)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRequestStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_play: Vec<PlayRequestStats>,
}

/// 单剧目申领统计
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRequestStats {
    pub play_id: String,
    pub play_title: Option<String>, // 剧目已删除时为空
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
}

/// 剧目内嵌申领视图 (只读投影)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayMaterialRequests {
    pub play: Play,
    pub requests: Vec<MaterialRequestView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRequestView {
    pub request: MaterialRequest,
    pub actor_name: Option<String>,
}

/// 汇总桶
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AmountBucket {
    pub count: i64,
    pub total_cost: f64,
}

impl AmountBucket {
    fn add(&mut self, count: i64, total_cost: f64) {
        self.count += count;
        self.total_cost += total_cost;
    }
}

/// 财务汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub total_orders: i64,
    pub by_payment_status: BTreeMap<String, AmountBucket>,
    pub paid: AmountBucket,             // Paid + Confirmed
    pub paid_unconfirmed: AmountBucket, // 已付款, 供应商未确认
}

fn zero_filled_request_counts() -> BTreeMap<String, i64> {
    MaterialRequestStatus::ALL
        .iter()
        .map(|s| (s.to_db_str().to_string(), 0))
        .collect()
}

// ==========================================
// DashboardApi
// ==========================================
pub struct DashboardApi {
    request_repo: Arc<MaterialRequestRepository>,
    play_repo: Arc<PlayRepository>,
    actor_repo: Arc<ActorRepository>,
    order_repo: Arc<OrderRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config: Arc<ConfigManager>,
}

impl DashboardApi {
    pub fn new(
        request_repo: Arc<MaterialRequestRepository>,
        play_repo: Arc<PlayRepository>,
        actor_repo: Arc<ActorRepository>,
        order_repo: Arc<OrderRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            request_repo,
            play_repo,
            actor_repo,
            order_repo,
            action_log_repo,
            config,
        }
    }

    // ==========================================
    // 物料申领统计
    // ==========================================

    /// 全局与分剧目申领统计
    pub fn material_request_stats(&self) -> ApiResult<MaterialRequestStats> {
        let counts = self.request_repo.count_by_play_and_status()?;
        let titles: HashMap<String, String> = self
            .play_repo
            .list_plays()?
            .into_iter()
            .map(|p| (p.play_id, p.title))
            .collect();

        let mut by_status = zero_filled_request_counts();
        let mut by_play: BTreeMap<String, PlayRequestStats> = BTreeMap::new();
        let mut total = 0;

        for row in counts {
            total += row.count;
            *by_status.entry(row.status.to_db_str().to_string()).or_insert(0) += row.count;

            let play = by_play
                .entry(row.play_id.clone())
                .or_insert_with(|| PlayRequestStats {
                    play_id: row.play_id.clone(),
                    play_title: titles.get(&row.play_id).cloned(),
                    total: 0,
                    by_status: zero_filled_request_counts(),
                });
            play.total += row.count;
            *play.by_status.entry(row.status.to_db_str().to_string()).or_insert(0) += row.count;
        }

        Ok(MaterialRequestStats {
            total,
            by_status,
            by_play: by_play.into_values().collect(),
        })
    }

    /// 单剧目申领统计
    ///
    /// # 返回
    /// - `Err(NotFound)`: 剧目不存在且无任何申领
    pub fn material_request_stats_for_play(&self, play_id: &str) -> ApiResult<PlayRequestStats> {
        let play = self.play_repo.find_by_id(play_id)?;
        let requests = self.request_repo.list_by_play(play_id)?;

        if play.is_none() && requests.is_empty() {
            return Err(ApiError::NotFound(format!("剧目(id={})不存在", play_id)));
        }

        let mut by_status = zero_filled_request_counts();
        for request in &requests {
            *by_status.entry(request.status.to_db_str().to_string()).or_insert(0) += 1;
        }

        Ok(PlayRequestStats {
            play_id: play_id.to_string(),
            play_title: play.map(|p| p.title),
            total: requests.len() as i64,
            by_status,
        })
    }

    /// 剧目视图: 含指定状态申领的剧目及其申领
    pub fn plays_with_requests_in(
        &self,
        status: MaterialRequestStatus,
    ) -> ApiResult<Vec<PlayMaterialRequests>> {
        let mut grouped: BTreeMap<String, Vec<MaterialRequest>> = BTreeMap::new();
        for request in self.request_repo.list_by_status(status)? {
            grouped.entry(request.play_id.clone()).or_default().push(request);
        }

        let mut actor_names: HashMap<String, Option<String>> = HashMap::new();
        let mut views = Vec::with_capacity(grouped.len());

        for (play_id, requests) in grouped {
            // 剧目已删除的申领不进入剧目视图
            let Some(play) = self.play_repo.find_by_id(&play_id)? else {
                tracing::debug!(play_id = %play_id, "剧目不存在, 跳过投影");
                continue;
            };

            let mut items = Vec::with_capacity(requests.len());
            for request in requests {
                let actor_name = match actor_names.get(&request.actor_id) {
                    Some(name) => name.clone(),
                    None => {
                        let name = self.actor_repo.find_by_id(&request.actor_id)?.map(|a| a.name);
                        actor_names.insert(request.actor_id.clone(), name.clone());
                        name
                    }
                };
                items.push(MaterialRequestView { request, actor_name });
            }
            views.push(PlayMaterialRequests { play, requests: items });
        }

        Ok(views)
    }

    // ==========================================
    // 订单与财务
    // ==========================================

    /// 按 (订单状态, 付款状态) 筛选订单
    pub fn orders_by_status(
        &self,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> ApiResult<Vec<Order>> {
        Ok(self.order_repo.list_by_status(status, payment_status)?)
    }

    /// 财务汇总 (各付款状态补零; paid 含 Confirmed)
    pub fn finance_summary(&self) -> ApiResult<FinanceSummary> {
        let total_orders = self.order_repo.count_all()?;

        let mut by_payment_status: BTreeMap<String, AmountBucket> = PaymentStatus::ALL
            .iter()
            .map(|s| (s.to_db_str().to_string(), AmountBucket::default()))
            .collect();
        let mut paid = AmountBucket::default();
        let mut paid_unconfirmed = AmountBucket::default();

        for row in self.order_repo.totals_by_payment_status()? {
            by_payment_status
                .entry(row.payment_status.to_db_str().to_string())
                .or_default()
                .add(row.count, row.total_cost);

            if row.payment_status.is_settled() {
                paid.add(row.count, row.total_cost);
            }
            if row.payment_status == PaymentStatus::Paid {
                paid_unconfirmed.add(row.count, row.total_cost);
            }
        }

        Ok(FinanceSummary {
            total_orders,
            by_payment_status,
            paid,
            paid_unconfirmed,
        })
    }

    /// 最近付款动态
    ///
    /// # 参数
    /// - `limit`: 缺省取配置 finance.recent_payments_limit
    pub fn recent_payment_activity(&self, limit: Option<i64>) -> ApiResult<Vec<Order>> {
        let limit = match limit {
            Some(l) if l > 0 => l,
            Some(l) => {
                return Err(ApiError::InvalidInput(format!("limit必须大于0, 实际为{}", l)));
            }
            None => {
                self.config
                    .load_workflow_config()
                    .map_err(ApiError::config_read)?
                    .recent_payments_limit
            }
        };
        Ok(self.order_repo.list_recent_payment_activity(limit)?)
    }

    /// 已付款待供应商确认的订单
    pub fn orders_pending_supplier_confirmation(
        &self,
        supplier: Option<&str>,
    ) -> ApiResult<Vec<Order>> {
        Ok(self.order_repo.list_awaiting_supplier_confirmation(supplier)?)
    }

    // ==========================================
    // 审计查询
    // ==========================================

    pub fn recent_actions(&self, limit: i64) -> ApiResult<Vec<ActionLog>> {
        if limit <= 0 {
            return Err(ApiError::InvalidInput(format!("limit必须大于0, 实际为{}", limit)));
        }
        Ok(self.action_log_repo.find_recent(limit)?)
    }

    pub fn entity_history(&self, entity_type: EntityType, entity_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_entity(entity_type, entity_id)?)
    }
}
