// ==========================================
// 剧院制作后台 - 输入校验器
// ==========================================
// 职责: 工作流入口参数校验 (在任何状态读取之前执行)
// 红线: 校验失败不得产生任何写入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::item::{ItemEdit, NewItem};
use crate::domain::material_request::MaterialLine;
use crate::domain::order::{NewOrder, OrderEdit};

/// 校验必填文本 (去除首尾空白后非空)
pub fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

/// 校验可选文本 (提供时不可为空白)
fn optional_text_present(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// 库存变动数量: 必须 >= 1
pub fn validate_stock_quantity(quantity: i64) -> ApiResult<()> {
    if quantity < 1 {
        return Err(ApiError::InvalidQuantity(format!(
            "库存变动数量必须大于0, 实际为{}",
            quantity
        )));
    }
    Ok(())
}

/// 物料申领明细校验
///
/// # 规则
/// - 明细非空
/// - 每行名称非空、数量 >= 1
pub fn validate_materials(materials: &[MaterialLine]) -> ApiResult<()> {
    if materials.is_empty() {
        return Err(ApiError::InvalidInput("申领物料列表不能为空".to_string()));
    }

    for (idx, line) in materials.iter().enumerate() {
        if line.name.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!("第{}行物料名称为空", idx + 1)));
        }
        if line.quantity < 1 {
            return Err(ApiError::InvalidInput(format!(
                "第{}行物料数量必须大于0 (物料: {}, 数量: {})",
                idx + 1,
                line.name,
                line.quantity
            )));
        }
    }
    Ok(())
}

fn validate_quantity_and_price(quantity: i64, unit_price: f64) -> ApiResult<()> {
    if quantity < 1 {
        return Err(ApiError::InvalidInput(format!(
            "订单数量必须大于0, 实际为{}",
            quantity
        )));
    }
    if !(unit_price > 0.0) || !unit_price.is_finite() {
        return Err(ApiError::InvalidInput(format!(
            "单价必须大于0, 实际为{}",
            unit_price
        )));
    }
    Ok(())
}

/// 新建订单校验
///
/// # 规则
/// - quantity >= 1, unit_price > 0
/// - 物品: item_id 或 item_name 至少其一
/// - 供应商: supplier_id 或 supplier_name 至少其一
pub fn validate_new_order(input: &NewOrder) -> ApiResult<()> {
    validate_quantity_and_price(input.quantity, input.unit_price)?;

    if !optional_text_present(input.item_id.as_deref())
        && !optional_text_present(input.item_name.as_deref())
    {
        return Err(ApiError::InvalidInput("必须提供物品ID或物品名称".to_string()));
    }
    if !optional_text_present(input.supplier_id.as_deref())
        && !optional_text_present(input.supplier_name.as_deref())
    {
        return Err(ApiError::InvalidInput("必须提供供应商ID或供应商名称".to_string()));
    }
    Ok(())
}

/// 订单编辑校验 (仅校验提供的字段)
pub fn validate_order_edit(edit: &OrderEdit) -> ApiResult<()> {
    if let Some(quantity) = edit.quantity {
        if quantity < 1 {
            return Err(ApiError::InvalidInput(format!(
                "订单数量必须大于0, 实际为{}",
                quantity
            )));
        }
    }
    if let Some(price) = edit.unit_price {
        if !(price > 0.0) || !price.is_finite() {
            return Err(ApiError::InvalidInput(format!("单价必须大于0, 实际为{}", price)));
        }
    }
    Ok(())
}

/// 新建物品校验
pub fn validate_new_item(input: &NewItem) -> ApiResult<()> {
    require_text("物品名称", &input.name)?;
    require_text("计量单位", &input.unit)?;

    if input.initial_stock < 0 {
        return Err(ApiError::InvalidQuantity(format!(
            "初始库存不能为负, 实际为{}",
            input.initial_stock
        )));
    }

    let thresholds = [
        ("low_stock_threshold", input.low_stock_threshold),
        ("min_stock_level", input.min_stock_level),
        ("max_stock_level", input.max_stock_level),
        ("reorder_point", input.reorder_point),
    ];
    for (field, value) in thresholds {
        if value < 0 {
            return Err(ApiError::InvalidInput(format!("{}不能为负, 实际为{}", field, value)));
        }
    }

    if input.unit_cost < 0.0 || input.selling_price < 0.0 {
        return Err(ApiError::InvalidInput("价格不能为负".to_string()));
    }
    Ok(())
}

/// 物品资料修改校验
pub fn validate_item_edit(edit: &ItemEdit) -> ApiResult<()> {
    if let Some(name) = edit.name.as_deref() {
        require_text("物品名称", name)?;
    }
    if let Some(unit) = edit.unit.as_deref() {
        require_text("计量单位", unit)?;
    }

    let thresholds = [
        ("low_stock_threshold", edit.low_stock_threshold),
        ("min_stock_level", edit.min_stock_level),
        ("max_stock_level", edit.max_stock_level),
        ("reorder_point", edit.reorder_point),
    ];
    for (field, value) in thresholds {
        if let Some(value) = value.filter(|v| *v < 0) {
            return Err(ApiError::InvalidInput(format!("{}不能为负, 实际为{}", field, value)));
        }
    }

    let negative_price = [edit.unit_cost, edit.selling_price]
        .into_iter()
        .flatten()
        .any(|p| p < 0.0 || !p.is_finite());
    if negative_price {
        return Err(ApiError::InvalidInput("价格不能为负".to_string()));
    }
    Ok(())
}
