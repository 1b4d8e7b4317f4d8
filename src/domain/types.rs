// ==========================================
// 剧院制作后台 - 领域类型定义
// ==========================================
// 依据: 工作流核心 - 数据模型 (Item / MaterialRequest / Order)
// 约定: to_db_str 与数据库存储值一致, from_str 大小写不敏感
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 物品类别 (Item Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Electronics,
    Furniture,
    Stationery,
    Costumes,
    Cleaning,
    Food,
    Beverages,
    Office,
    Medical,
    Equipment,
    Props,
    Materials,
    Other,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 13] = [
        ItemCategory::Electronics,
        ItemCategory::Furniture,
        ItemCategory::Stationery,
        ItemCategory::Costumes,
        ItemCategory::Cleaning,
        ItemCategory::Food,
        ItemCategory::Beverages,
        ItemCategory::Office,
        ItemCategory::Medical,
        ItemCategory::Equipment,
        ItemCategory::Props,
        ItemCategory::Materials,
        ItemCategory::Other,
    ];

    /// 从字符串严格解析（未知值返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        let key = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.to_db_str().eq_ignore_ascii_case(key))
    }

    /// 历史数据归一化
    ///
    /// 旧数据中存在 "equipment" / "Tools" 等非标准值:
    /// - 工具类归入 Equipment
    /// - 其余无法识别的值归入 Other
    pub fn normalize_legacy(s: &str) -> Self {
        if let Some(c) = Self::from_str(s) {
            return c;
        }
        match s.trim().to_lowercase().as_str() {
            "tools" | "tool" => ItemCategory::Equipment,
            _ => ItemCategory::Other,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ItemCategory::Electronics => "Electronics",
            ItemCategory::Furniture => "Furniture",
            ItemCategory::Stationery => "Stationery",
            ItemCategory::Costumes => "Costumes",
            ItemCategory::Cleaning => "Cleaning",
            ItemCategory::Food => "Food",
            ItemCategory::Beverages => "Beverages",
            ItemCategory::Office => "Office",
            ItemCategory::Medical => "Medical",
            ItemCategory::Equipment => "Equipment",
            ItemCategory::Props => "Props",
            ItemCategory::Materials => "Materials",
            ItemCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 物料申领状态 (Material Request Status)
// ==========================================
// 主路径: pending → approved → processing → prepared → collected
// 驳回: pending / approved → rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialRequestStatus {
    Pending,    // 待审批
    Approved,   // 已批准
    Processing, // 备料中
    Prepared,   // 已备好
    Collected,  // 已领取
    Rejected,   // 已驳回
}

impl MaterialRequestStatus {
    pub const ALL: [MaterialRequestStatus; 6] = [
        MaterialRequestStatus::Pending,
        MaterialRequestStatus::Approved,
        MaterialRequestStatus::Processing,
        MaterialRequestStatus::Prepared,
        MaterialRequestStatus::Collected,
        MaterialRequestStatus::Rejected,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(MaterialRequestStatus::Pending),
            "approved" => Some(MaterialRequestStatus::Approved),
            "processing" => Some(MaterialRequestStatus::Processing),
            "prepared" => Some(MaterialRequestStatus::Prepared),
            "collected" => Some(MaterialRequestStatus::Collected),
            "rejected" => Some(MaterialRequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            MaterialRequestStatus::Pending => "pending",
            MaterialRequestStatus::Approved => "approved",
            MaterialRequestStatus::Processing => "processing",
            MaterialRequestStatus::Prepared => "prepared",
            MaterialRequestStatus::Collected => "collected",
            MaterialRequestStatus::Rejected => "rejected",
        }
    }

    /// 终态: collected / rejected
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MaterialRequestStatus::Collected | MaterialRequestStatus::Rejected
        )
    }
}

impl fmt::Display for MaterialRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 采购订单状态 (Order Status)
// ==========================================
// 主路径: Pending → Approved → Processing → Delivered → Received(入库)
//        → Payment Pending → (付款子流程) → Paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Approved,
    Processing,
    Delivered,
    Received,
    #[serde(rename = "Payment Pending")]
    PaymentPending,
    Paid,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Pending,
        OrderStatus::Approved,
        OrderStatus::Processing,
        OrderStatus::Delivered,
        OrderStatus::Received,
        OrderStatus::PaymentPending,
        OrderStatus::Paid,
        OrderStatus::Rejected,
        OrderStatus::Cancelled,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        let key = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.to_db_str().eq_ignore_ascii_case(key))
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Approved => "Approved",
            OrderStatus::Processing => "Processing",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Received => "Received",
            OrderStatus::PaymentPending => "Payment Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// 已产生财务/库存影响，禁止删除
    pub fn forbids_deletion(&self) -> bool {
        matches!(
            self,
            OrderStatus::Approved | OrderStatus::Delivered | OrderStatus::Received | OrderStatus::Paid
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 付款状态 (Payment Status)
// ==========================================
// 子路径: Pending → Submitted → Approved → Paid → Confirmed
// 驳回: Submitted → Rejected
// 订单撤销: 未付款的付款记录一并置 Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Submitted,
    Approved,
    Paid,
    Rejected,
    Confirmed,
    Cancelled,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 7] = [
        PaymentStatus::Pending,
        PaymentStatus::Submitted,
        PaymentStatus::Approved,
        PaymentStatus::Paid,
        PaymentStatus::Rejected,
        PaymentStatus::Confirmed,
        PaymentStatus::Cancelled,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        let key = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.to_db_str().eq_ignore_ascii_case(key))
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Submitted => "Submitted",
            PaymentStatus::Approved => "Approved",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Rejected => "Rejected",
            PaymentStatus::Confirmed => "Confirmed",
            PaymentStatus::Cancelled => "Cancelled",
        }
    }

    /// 付款已发出（含供应商已确认）
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Confirmed)
    }

    /// 付款流程已结束 (已付款或随订单撤销)
    pub fn is_closed(&self) -> bool {
        self.is_settled() || *self == PaymentStatus::Cancelled
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 付款方式 (Payment Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "MPesa")]
    MPesa,
    Cheque,
    Cash,
    Other,
}

impl PaymentMethod {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bank transfer" | "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "mpesa" | "m-pesa" => Some(PaymentMethod::MPesa),
            "cheque" | "check" => Some(PaymentMethod::Cheque),
            "cash" => Some(PaymentMethod::Cash),
            "other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::MPesa => "MPesa",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Other => "Other",
        }
    }

    /// 非现金付款必须提供交易号
    pub fn requires_transaction_id(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 员工角色 (Staff Role)
// ==========================================
// 由员工所属部门映射而来
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Administration, // 行政/管理员
    Finance,        // 财务
    Inventory,      // 库管
    Procurement,    // 采购
    Supplier,       // 供应商
    Production,     // 制作部门
    Other,
}

impl StaffRole {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "administration" | "admin" => StaffRole::Administration,
            "finance" | "accounts" => StaffRole::Finance,
            "inventory" | "store" => StaffRole::Inventory,
            "procurement" => StaffRole::Procurement,
            "supplier" | "suppliers" => StaffRole::Supplier,
            "production" => StaffRole::Production,
            _ => StaffRole::Other,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            StaffRole::Administration => "Administration",
            StaffRole::Finance => "Finance",
            StaffRole::Inventory => "Inventory",
            StaffRole::Procurement => "Procurement",
            StaffRole::Supplier => "Supplier",
            StaffRole::Production => "Production",
            StaffRole::Other => "Other",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 演员分配状态 (Assignment Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Active,
    Inactive,
}

impl AssignmentStatus {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "inactive" => AssignmentStatus::Inactive,
            _ => AssignmentStatus::Active,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "Active",
            AssignmentStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
