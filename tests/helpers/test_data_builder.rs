// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use theater_backoffice::domain::{MaterialLine, NewOrder};

// ==========================================
// NewOrder 构建器
// ==========================================

pub struct OrderBuilder {
    input: NewOrder,
}

impl OrderBuilder {
    /// 自由文本物品 + 供应商名称
    pub fn new(quantity: i64, unit_price: f64) -> Self {
        Self {
            input: NewOrder {
                item_name: Some("Gaffer tape".to_string()),
                supplier_name: Some("Stage Supplies Ltd".to_string()),
                quantity,
                unit_price,
                ..NewOrder::default()
            },
        }
    }

    /// 关联库存物品 (入库时增加库存)
    pub fn for_item(mut self, item_id: &str) -> Self {
        self.input.item_id = Some(item_id.to_string());
        self.input.item_name = None;
        self
    }

    /// 关联供应商员工
    pub fn supplied_by(mut self, supplier_id: &str) -> Self {
        self.input.supplier_id = Some(supplier_id.to_string());
        self
    }

    pub fn requested_by(mut self, staff_id: &str) -> Self {
        self.input.requester_id = Some(staff_id.to_string());
        self
    }

    pub fn build(self) -> NewOrder {
        self.input
    }
}

// ==========================================
// 物料明细
// ==========================================

pub fn costume_materials() -> Vec<MaterialLine> {
    vec![
        MaterialLine::new("Costumes – Male", 1, "pcs"),
        MaterialLine::new("Hair Wigs", 2, "pcs"),
    ]
}

pub fn single_material(name: &str, quantity: i64) -> Vec<MaterialLine> {
    vec![MaterialLine::new(name, quantity, "pcs")]
}
