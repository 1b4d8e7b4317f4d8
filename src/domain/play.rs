// ==========================================
// 剧院制作后台 - 剧目与演员
// ==========================================

use crate::domain::types::AssignmentStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Play - 剧目
// ==========================================
// 对齐: play 表
// 物料申领不内嵌于此 (见 material_request 表, 按 play_id 投影)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Play {
    pub play_id: String,
    pub title: String,
    pub description: Option<String>,
    pub director: Option<String>,
    pub venue: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

// ==========================================
// Actor - 演员
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: String,
    pub name: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

// ==========================================
// PlayActorAssignment - 剧目演员分配
// ==========================================
// 对齐: play_actor 表 (play_id, actor_id) 唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayActorAssignment {
    pub play_id: String,
    pub actor_id: String,
    pub role_name: Option<String>,
    pub status: AssignmentStatus,
    pub assigned_at: NaiveDateTime,
}

impl PlayActorAssignment {
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}
