//! Order visibility classification. Pure reads: given a driver and the order
//! set, split out the orders the driver can take and the ones they are
//! already working. Re-run on every request and on every pushed event.

use crate::models::driver::Driver;
use crate::models::order::{Order, OrderStatus};

#[derive(Debug, Default)]
pub struct ClassifiedOrders {
    pub available: Vec<Order>,
    pub active: Vec<Order>,
}

/// Pending, matches the driver's vehicle, and the driver has not already
/// turned it down. An order whose vehicle type matches no driver is simply
/// invisible, never an error.
pub fn is_available_to(order: &Order, driver: &Driver) -> bool {
    order.status == OrderStatus::Pending
        && order.vehicle_type == driver.vehicle_type
        && !order.declined_drivers.contains(&driver.uid)
}

/// Assigned to this driver and still in flight.
pub fn is_active_for(order: &Order, uid: &str) -> bool {
    order.driver_id.as_deref() == Some(uid)
        && matches!(
            order.status,
            OrderStatus::Accepted | OrderStatus::PickedUp | OrderStatus::InTransit
        )
}

pub fn classify<'a, I>(driver: &Driver, orders: I) -> ClassifiedOrders
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut classified = ClassifiedOrders::default();

    for order in orders {
        if is_available_to(order, driver) {
            classified.available.push(order.clone());
        } else if is_active_for(order, &driver.uid) {
            classified.active.push(order.clone());
        }
    }

    classified.available.sort_by_key(|o| o.created_at);
    classified.active.sort_by_key(|o| o.created_at);
    classified
}
