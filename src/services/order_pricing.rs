use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::repositories::{
    NewDetailAddOn, OrderDetailAddOnStore, OrderRecord, ProductAddOnStore, ProductSizeStore,
    ProductStore,
};

/// Client-submitted order line, echoed back after checkout so add-ons
/// can be bound to the persisted details. `size_id` arrives as a raw
/// string; anything unparsable means "no size".
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: i32,
    pub qty: i32,
    #[serde(default)]
    pub size_id: Option<String>,
    #[serde(default)]
    pub add_on_ids: Vec<i32>,
}

/// Reconciles client-submitted lines against persisted order details
/// and records add-on bindings with snapshot prices.
///
/// Matching is deliberately conservative: a line binds only when the
/// product, quantity, size, and recomputed unit price all agree with a
/// not-yet-claimed detail. Anything else is skipped without error;
/// pricing mismatches must never corrupt a stored order.
pub struct OrderPricingService {
    products: Arc<dyn ProductStore>,
    product_sizes: Arc<dyn ProductSizeStore>,
    product_add_ons: Arc<dyn ProductAddOnStore>,
    detail_add_ons: Arc<dyn OrderDetailAddOnStore>,
}

impl OrderPricingService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        product_sizes: Arc<dyn ProductSizeStore>,
        product_add_ons: Arc<dyn ProductAddOnStore>,
        detail_add_ons: Arc<dyn OrderDetailAddOnStore>,
    ) -> Self {
        Self {
            products,
            product_sizes,
            product_add_ons,
            detail_add_ons,
        }
    }

    #[instrument(skip(self, order, lines), fields(order_id = order.order.order_id))]
    pub async fn attach_add_ons(
        &self,
        order: &OrderRecord,
        lines: &[OrderLineRequest],
    ) -> Result<(), ServiceError> {
        if lines.is_empty() || order.details.is_empty() {
            return Ok(());
        }

        // Each persisted detail may satisfy at most one request line.
        let mut claimed = vec![false; order.details.len()];

        for line in lines {
            let Some(product) = self.products.find_by_id(line.product_id).await? else {
                debug!(product_id = line.product_id, "product missing, line skipped");
                continue;
            };

            let size_id = line
                .size_id
                .as_deref()
                .and_then(|raw| raw.trim().parse::<i32>().ok());

            let size_delta = match size_id {
                Some(sid) => self
                    .product_sizes
                    .find_by_product_and_size(product.product_id, sid)
                    .await?
                    .and_then(|ps| ps.price)
                    .unwrap_or(Decimal::ZERO),
                None => Decimal::ZERO,
            };

            let mut add_ons = Vec::with_capacity(line.add_on_ids.len());
            for add_on_id in &line.add_on_ids {
                match self
                    .product_add_ons
                    .find_by_product_and_add_on(product.product_id, *add_on_id)
                    .await?
                {
                    Some(assoc) => add_ons.push(assoc),
                    None => {
                        debug!(
                            product_id = product.product_id,
                            add_on_id, "add-on not sold with product, ignored"
                        );
                    }
                }
            }

            let add_on_total: Decimal = add_ons
                .iter()
                .map(|a| a.price.unwrap_or(Decimal::ZERO))
                .sum();
            let expected_unit =
                product.price.unwrap_or(Decimal::ZERO) + size_delta + add_on_total;

            let matched = order.details.iter().enumerate().find(|(idx, candidate)| {
                !claimed[*idx]
                    && candidate.product.as_ref().map(|p| p.product_id)
                        == Some(product.product_id)
                    && candidate.detail.quantity == line.qty
                    && candidate.detail.size_id == size_id
                    && candidate.detail.unit_price.unwrap_or(Decimal::ZERO) == expected_unit
            });

            let Some((idx, detail)) = matched else {
                debug!(
                    product_id = product.product_id,
                    "no unclaimed detail matches line, skipped"
                );
                continue;
            };
            claimed[idx] = true;

            if add_ons.is_empty() {
                continue;
            }
            let rows: Vec<NewDetailAddOn> = add_ons
                .into_iter()
                .map(|assoc| NewDetailAddOn {
                    order_detail_id: detail.detail.order_detail_id,
                    add_on_id: assoc.add_on.add_on_id,
                    unit_price: assoc.price.unwrap_or(Decimal::ZERO),
                })
                .collect();
            self.detail_add_ons.save_all(rows).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{order, order_detail, product, product_size};
    use crate::repositories::catalog::{
        MockProductAddOnStore, MockProductSizeStore, MockProductStore,
    };
    use crate::repositories::order_add_ons::MockOrderDetailAddOnStore;
    use crate::repositories::{OrderLine, ProductAddOn};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(id: i32, price: Option<Decimal>) -> product::Model {
        product::Model {
            product_id: id,
            name: format!("Product {id}"),
            image_url: None,
            price,
            stock_quantity: 100,
            is_active: true,
        }
    }

    fn add_on(id: i32, name: &str, price: Option<Decimal>) -> ProductAddOn {
        ProductAddOn {
            add_on: crate::entities::add_on::Model {
                add_on_id: id,
                name: name.to_string(),
            },
            price,
        }
    }

    fn detail(
        detail_id: i32,
        product: product::Model,
        qty: i32,
        size_id: Option<i32>,
        unit_price: Option<Decimal>,
    ) -> OrderLine {
        OrderLine {
            detail: order_detail::Model {
                order_detail_id: detail_id,
                order_id: 1,
                product_id: Some(product.product_id),
                size_id,
                product_name: Some(product.name.clone()),
                quantity: qty,
                unit_price,
                line_total: unit_price.map(|p| p * Decimal::from(qty)),
            },
            product: Some(product),
            size: None,
        }
    }

    fn order_with(details: Vec<OrderLine>) -> OrderRecord {
        OrderRecord {
            order: order::Model {
                order_id: 1,
                customer_id: Some(5),
                table_id: None,
                address_id: None,
                shipper_id: None,
                status: "PENDING".into(),
                subtotal: None,
                shipping_fee: None,
                grand_total: None,
                notes: None,
                created_at: Utc::now(),
                updated_at: None,
            },
            customer: None,
            table: None,
            address: None,
            details,
            payments: vec![],
        }
    }

    struct Fixture {
        products: MockProductStore,
        product_sizes: MockProductSizeStore,
        product_add_ons: MockProductAddOnStore,
        detail_add_ons: MockOrderDetailAddOnStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                products: MockProductStore::new(),
                product_sizes: MockProductSizeStore::new(),
                product_add_ons: MockProductAddOnStore::new(),
                detail_add_ons: MockOrderDetailAddOnStore::new(),
            }
        }

        fn service(self) -> OrderPricingService {
            OrderPricingService::new(
                Arc::new(self.products),
                Arc::new(self.product_sizes),
                Arc::new(self.product_add_ons),
                Arc::new(self.detail_add_ons),
            )
        }
    }

    fn request(
        product_id: i32,
        qty: i32,
        size_id: Option<&str>,
        add_on_ids: Vec<i32>,
    ) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            qty,
            size_id: size_id.map(str::to_string),
            add_on_ids,
        }
    }

    #[tokio::test]
    async fn empty_request_touches_nothing() {
        // No expectations: any store call panics.
        let service = Fixture::new().service();
        let order = order_with(vec![detail(1, product(10, Some(dec!(30000))), 1, None, Some(dec!(30000)))]);
        service.attach_add_ons(&order, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn order_without_details_touches_nothing() {
        let service = Fixture::new().service();
        let order = order_with(vec![]);
        service
            .attach_add_ons(&order, &[request(10, 1, None, vec![1])])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_product_skips_the_line() {
        let mut fixture = Fixture::new();
        fixture.products.expect_find_by_id().returning(|_| Ok(None));
        let service = fixture.service();
        let order = order_with(vec![detail(1, product(10, Some(dec!(30000))), 1, None, Some(dec!(30000)))]);
        service
            .attach_add_ons(&order, &[request(99, 1, None, vec![1])])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn matching_line_persists_snapshot_priced_add_ons() {
        let mut fixture = Fixture::new();
        fixture
            .products
            .expect_find_by_id()
            .returning(|id| Ok(Some(product(id, Some(dec!(30000))))));
        fixture
            .product_sizes
            .expect_find_by_product_and_size()
            .withf(|&pid, &sid| pid == 10 && sid == 2)
            .returning(|product_id, size_id| {
                Ok(Some(product_size::Model {
                    product_size_id: 1,
                    product_id,
                    size_id,
                    price: Some(dec!(5000)),
                }))
            });
        fixture
            .product_add_ons
            .expect_find_by_product_and_add_on()
            .returning(|_, add_on_id| Ok(Some(add_on(add_on_id, "Espresso shot", Some(dec!(7000))))));
        // unit = 30000 + 5000 + 7000
        fixture
            .detail_add_ons
            .expect_save_all()
            .times(1)
            .withf(|rows| {
                rows.len() == 1
                    && rows[0].order_detail_id == 1
                    && rows[0].add_on_id == 4
                    && rows[0].unit_price == dec!(7000)
            })
            .returning(|_| Ok(()));
        let service = fixture.service();
        let order = order_with(vec![detail(
            1,
            product(10, Some(dec!(30000))),
            2,
            Some(2),
            Some(dec!(42000)),
        )]);
        service
            .attach_add_ons(&order, &[request(10, 2, Some("2"), vec![4])])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unit_price_mismatch_skips_silently() {
        let mut fixture = Fixture::new();
        fixture
            .products
            .expect_find_by_id()
            .returning(|id| Ok(Some(product(id, Some(dec!(30000))))));
        fixture
            .product_add_ons
            .expect_find_by_product_and_add_on()
            .returning(|_, add_on_id| Ok(Some(add_on(add_on_id, "Espresso shot", Some(dec!(7000))))));
        // Stored detail says 30000; expected is 37000. No save happens.
        let service = fixture.service();
        let order = order_with(vec![detail(
            1,
            product(10, Some(dec!(30000))),
            1,
            None,
            Some(dec!(30000)),
        )]);
        service
            .attach_add_ons(&order, &[request(10, 1, None, vec![4])])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unparsable_size_means_no_size_and_no_delta() {
        let mut fixture = Fixture::new();
        fixture
            .products
            .expect_find_by_id()
            .returning(|id| Ok(Some(product(id, Some(dec!(30000))))));
        // No product_sizes expectation: a size lookup would panic.
        fixture
            .product_add_ons
            .expect_find_by_product_and_add_on()
            .returning(|_, add_on_id| Ok(Some(add_on(add_on_id, "Pearls", Some(dec!(4000))))));
        fixture
            .detail_add_ons
            .expect_save_all()
            .times(1)
            .returning(|_| Ok(()));
        let service = fixture.service();
        let order = order_with(vec![detail(
            1,
            product(10, Some(dec!(30000))),
            1,
            None,
            Some(dec!(34000)),
        )]);
        service
            .attach_add_ons(&order, &[request(10, 1, Some("not-a-number"), vec![4])])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn null_prices_count_as_zero() {
        let mut fixture = Fixture::new();
        fixture
            .products
            .expect_find_by_id()
            .returning(|id| Ok(Some(product(id, None))));
        fixture
            .product_add_ons
            .expect_find_by_product_and_add_on()
            .returning(|_, add_on_id| Ok(Some(add_on(add_on_id, "Cream", None))));
        fixture
            .detail_add_ons
            .expect_save_all()
            .times(1)
            .withf(|rows| rows.len() == 1 && rows[0].unit_price == Decimal::ZERO)
            .returning(|_| Ok(()));
        let service = fixture.service();
        // Expected unit collapses to zero, matching a detail with no price.
        let order = order_with(vec![detail(1, product(10, None), 1, None, None)]);
        service
            .attach_add_ons(&order, &[request(10, 1, None, vec![4])])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_request_lines_cannot_claim_one_detail_twice() {
        let mut fixture = Fixture::new();
        fixture
            .products
            .expect_find_by_id()
            .returning(|id| Ok(Some(product(id, Some(dec!(30000))))));
        fixture
            .product_add_ons
            .expect_find_by_product_and_add_on()
            .returning(|_, add_on_id| Ok(Some(add_on(add_on_id, "Espresso shot", Some(dec!(7000))))));
        // Only one detail matches, so only one save despite two lines.
        fixture
            .detail_add_ons
            .expect_save_all()
            .times(1)
            .returning(|_| Ok(()));
        let service = fixture.service();
        let order = order_with(vec![detail(
            1,
            product(10, Some(dec!(30000))),
            1,
            None,
            Some(dec!(37000)),
        )]);
        let line = request(10, 1, None, vec![4]);
        service
            .attach_add_ons(&order, &[line.clone(), line])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn line_with_no_resolved_add_ons_claims_but_writes_nothing() {
        let mut fixture = Fixture::new();
        fixture
            .products
            .expect_find_by_id()
            .returning(|id| Ok(Some(product(id, Some(dec!(30000))))));
        fixture
            .product_add_ons
            .expect_find_by_product_and_add_on()
            .returning(|_, _| Ok(None));
        // save_all must not be called for an empty binding set.
        let service = fixture.service();
        let order = order_with(vec![detail(
            1,
            product(10, Some(dec!(30000))),
            1,
            None,
            Some(dec!(30000)),
        )]);
        service
            .attach_add_ons(&order, &[request(10, 1, None, vec![9])])
            .await
            .unwrap();
    }
}
