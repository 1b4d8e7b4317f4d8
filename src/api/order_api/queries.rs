use super::*;

use crate::domain::order::Payment;

impl OrderApi {
    // ==========================================
    // 查询接口
    // ==========================================

    pub fn get_order(&self, order_id: &str) -> ApiResult<Order> {
        self.order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("订单(id={})不存在", order_id)))
    }

    /// 订单内嵌的付款记录
    pub fn get_payment_details(&self, order_id: &str) -> ApiResult<Payment> {
        Ok(self.get_order(order_id)?.payment)
    }

    /// 供应商名下订单 (按供应商ID或名称匹配)
    pub fn list_orders_for_supplier(&self, supplier: &str) -> ApiResult<Vec<Order>> {
        if supplier.trim().is_empty() {
            return Err(ApiError::InvalidInput("供应商不能为空".to_string()));
        }
        Ok(self.order_repo.list_by_supplier(supplier.trim())?)
    }
}
