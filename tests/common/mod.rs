//! In-memory store fakes and fixture builders shared by the
//! integration tests.

// Not every test binary uses every fake.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use std::sync::Mutex;

use kopi_api::entities::{
    add_on, address, dining_table, discount_code, order, order_detail, payment, product,
    product_add_on, product_size, size, user, PaymentMethod, PaymentStatus,
};
use kopi_api::errors::ServiceError;
use kopi_api::repositories::{
    DetailAddOn, DiscountCodeStore, NewDetailAddOn, OrderDetailAddOnStore, OrderLine,
    OrderRecord, OrderStore, ProductAddOn, ProductAddOnStore, ProductSizeStore, ProductStore,
};
use kopi_api::services::notifications::NotificationService;
use kopi_api::services::tables::TableAvailability;

const TERMINAL: [&str; 2] = ["COMPLETED", "CANCELLED"];

fn page_slice<T: Clone>(items: Vec<T>, page: u64, limit: u64) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let start = ((page - 1) * limit) as usize;
    let slice = items.into_iter().skip(start).take(limit as usize).collect();
    (slice, total)
}

#[derive(Default)]
pub struct InMemoryOrders {
    pub records: Mutex<Vec<OrderRecord>>,
}

impl InMemoryOrders {
    pub fn with(records: Vec<OrderRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn get(&self, order_id: i32) -> Option<OrderRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.order.order_id == order_id)
            .cloned()
    }

    fn filtered(&self, keep: impl Fn(&OrderRecord) -> bool) -> Vec<OrderRecord> {
        let mut records: Vec<OrderRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| keep(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        records
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn find_by_id(&self, order_id: i32) -> Result<Option<OrderRecord>, ServiceError> {
        Ok(self.get(order_id))
    }

    async fn find_by_customer(
        &self,
        customer_id: i32,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError> {
        let records = self.filtered(|r| r.order.customer_id == Some(customer_id));
        Ok(page_slice(records, page, limit))
    }

    async fn find_by_status(
        &self,
        status: &str,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError> {
        let records = self.filtered(|r| r.order.status == status);
        Ok(page_slice(records, page, limit))
    }

    async fn find_active_dine_in(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError> {
        let records = self.filtered(|r| {
            !TERMINAL.contains(&r.order.status.as_str()) && r.order.address_id.is_none()
        });
        Ok(page_slice(records, page, limit))
    }

    async fn find_active_delivery(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderRecord>, u64), ServiceError> {
        let records = self.filtered(|r| {
            !TERMINAL.contains(&r.order.status.as_str()) && r.order.address_id.is_some()
        });
        Ok(page_slice(records, page, limit))
    }

    async fn save(&self, record: &OrderRecord) -> Result<(), ServiceError> {
        let mut records = self.records.lock().unwrap();
        if let Some(slot) = records
            .iter_mut()
            .find(|r| r.order.order_id == record.order.order_id)
        {
            *slot = record.clone();
        } else {
            records.push(record.clone());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCatalog {
    pub products: Mutex<Vec<product::Model>>,
    pub sizes: Vec<product_size::Model>,
    pub add_ons: Vec<add_on::Model>,
    pub product_add_ons: Vec<product_add_on::Model>,
}

impl InMemoryCatalog {
    pub fn stock_of(&self, product_id: i32) -> Option<i32> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.product_id == product_id)
            .map(|p| p.stock_quantity)
    }
}

#[async_trait]
impl ProductStore for InMemoryCatalog {
    async fn find_by_id(&self, product_id: i32) -> Result<Option<product::Model>, ServiceError> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.product_id == product_id)
            .cloned())
    }

    async fn save(&self, product: &product::Model) -> Result<(), ServiceError> {
        let mut products = self.products.lock().unwrap();
        if let Some(slot) = products
            .iter_mut()
            .find(|p| p.product_id == product.product_id)
        {
            *slot = product.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl ProductSizeStore for InMemoryCatalog {
    async fn find_by_product_and_size(
        &self,
        product_id: i32,
        size_id: i32,
    ) -> Result<Option<product_size::Model>, ServiceError> {
        Ok(self
            .sizes
            .iter()
            .find(|s| s.product_id == product_id && s.size_id == size_id)
            .cloned())
    }
}

#[async_trait]
impl ProductAddOnStore for InMemoryCatalog {
    async fn find_by_product_and_add_on(
        &self,
        product_id: i32,
        add_on_id: i32,
    ) -> Result<Option<ProductAddOn>, ServiceError> {
        let Some(assoc) = self
            .product_add_ons
            .iter()
            .find(|a| a.product_id == product_id && a.add_on_id == add_on_id)
        else {
            return Ok(None);
        };
        Ok(self
            .add_ons
            .iter()
            .find(|a| a.add_on_id == assoc.add_on_id)
            .map(|add_on| ProductAddOn {
                add_on: add_on.clone(),
                price: assoc.price,
            }))
    }
}

#[derive(Default)]
pub struct InMemoryDetailAddOns {
    pub rows: Mutex<Vec<NewDetailAddOn>>,
    pub add_ons: Vec<add_on::Model>,
}

#[async_trait]
impl OrderDetailAddOnStore for InMemoryDetailAddOns {
    async fn find_by_detail(
        &self,
        order_detail_id: i32,
    ) -> Result<Vec<DetailAddOn>, ServiceError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.order_detail_id == order_detail_id)
            .map(|r| DetailAddOn {
                add_on: self
                    .add_ons
                    .iter()
                    .find(|a| a.add_on_id == r.add_on_id)
                    .cloned(),
                unit_price: Some(r.unit_price),
            })
            .collect())
    }

    async fn save_all(&self, rows: Vec<NewDetailAddOn>) -> Result<(), ServiceError> {
        self.rows.lock().unwrap().extend(rows);
        Ok(())
    }
}

pub struct InMemoryDiscounts {
    pub codes: Vec<discount_code::Model>,
}

#[async_trait]
impl DiscountCodeStore for InMemoryDiscounts {
    async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<discount_code::Model>, ServiceError> {
        Ok(self
            .codes
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .cloned())
    }
}

#[derive(Default)]
pub struct RecordingTables {
    pub released: Mutex<Vec<i32>>,
}

#[async_trait]
impl TableAvailability for RecordingTables {
    async fn set_available_if_no_pending_orders(
        &self,
        table_id: i32,
    ) -> Result<(), ServiceError> {
        self.released.lock().unwrap().push(table_id);
        Ok(())
    }
}

pub struct NoopNotifier;

#[async_trait]
impl NotificationService for NoopNotifier {
    async fn notify_customer(
        &self,
        _order: &OrderRecord,
        _old_status: &str,
        _new_status: &str,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn notify_staff(
        &self,
        _order: &OrderRecord,
        _old_status: &str,
        _new_status: &str,
    ) -> Result<(), ServiceError> {
        Ok(())
    }
}

// ---- fixture builders ----

pub fn latte() -> product::Model {
    product::Model {
        product_id: 10,
        name: "Latte".into(),
        image_url: Some("img/latte.png".into()),
        price: Some(dec!(30000)),
        stock_quantity: 10,
        is_active: true,
    }
}

pub fn espresso_shot() -> add_on::Model {
    add_on::Model {
        add_on_id: 4,
        name: "Espresso shot".into(),
    }
}

pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog {
        products: Mutex::new(vec![latte()]),
        sizes: vec![product_size::Model {
            product_size_id: 1,
            product_id: 10,
            size_id: 2,
            price: Some(dec!(5000)),
        }],
        add_ons: vec![espresso_shot()],
        product_add_ons: vec![product_add_on::Model {
            product_add_on_id: 1,
            product_id: 10,
            add_on_id: 4,
            price: Some(dec!(7000)),
        }],
    }
}

pub fn customer() -> user::Model {
    user::Model {
        user_id: 5,
        full_name: Some("Anh Tran".into()),
        email: Some("anh@example.com".into()),
        role: Some("CUSTOMER".into()),
    }
}

/// One paid dine-in order for two large lattes with an espresso shot.
/// unit price = 30000 base + 5000 size + 7000 add-on.
pub fn seeded_order(order_id: i32) -> OrderRecord {
    OrderRecord {
        order: order::Model {
            order_id,
            customer_id: Some(5),
            table_id: Some(3),
            address_id: None,
            shipper_id: None,
            status: "PAID".into(),
            subtotal: Some(dec!(84000)),
            shipping_fee: None,
            grand_total: Some(dec!(84000)),
            notes: None,
            created_at: Utc::now() - Duration::minutes(10),
            updated_at: None,
        },
        customer: Some(customer()),
        table: Some(dining_table::Model {
            table_id: 3,
            number: 7,
            is_available: false,
        }),
        address: None,
        details: vec![OrderLine {
            detail: order_detail::Model {
                order_detail_id: 1,
                order_id,
                product_id: Some(10),
                size_id: Some(2),
                product_name: Some("Latte".into()),
                quantity: 2,
                unit_price: Some(dec!(42000)),
                line_total: Some(dec!(84000)),
            },
            product: Some(latte()),
            size: Some(size::Model {
                size_id: 2,
                name: "L".into(),
            }),
        }],
        payments: vec![payment::Model {
            payment_id: 1,
            order_id,
            method: Some(PaymentMethod::Cash),
            status: PaymentStatus::Pending,
            amount: Some(dec!(84000)),
            paid_at: None,
        }],
    }
}

pub fn shipped_order(order_id: i32) -> OrderRecord {
    let mut record = seeded_order(order_id);
    record.order.table_id = None;
    record.table = None;
    record.order.address_id = Some(4);
    record.address = Some(address::Model {
        address_id: 4,
        address_line: "12 Ly Tu Trong".into(),
        receiver_phone: Some("0900000000".into()),
    });
    record.order.shipping_fee = Some(dec!(15000));
    record.order.grand_total = Some(dec!(99000));
    record
}

pub fn welcome_code() -> discount_code::Model {
    let now = Utc::now();
    discount_code::Model {
        discount_code_id: 1,
        code: "WELCOME10".into(),
        discount_type: discount_code::DiscountType::Percent,
        value: dec!(10),
        min_order_amount: Some(dec!(50000)),
        is_active: true,
        starts_at: now - Duration::days(1),
        ends_at: now + Duration::days(1),
    }
}
