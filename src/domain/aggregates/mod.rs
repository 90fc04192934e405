//! Aggregates module
pub mod cart;
pub mod contact;
pub mod inventory;
pub mod invoice;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod product;
pub mod purchase;

pub use cart::{Cart, CartError, CartItem, CartLineKey};
pub use contact::{AccountError, Address, Contact, ContactChanges, ContactType, PostalFields, User, UserRole};
pub use inventory::{MovementDirection, MovementType, ReferenceType, StockChange, StockMovement};
pub use invoice::{CustomerInvoice, InvoiceError, InvoiceStatus, Settlement};
pub use order::{DeliveryPolicy, OrderError, OrderStatus, OrderTotals, PlaceOrder, SalesOrder, SalesOrderLine, ShippingAddress};
pub use payment::{AllocationTarget, Payment, PaymentAllocation, PaymentMethod, PaymentType};
pub use pricing::{AppliedCoupon, Coupon, CouponError, CouponStatus, DiscountOffer, EarlyPayComputation, OfferChannel, PaymentTerm};
pub use product::{
    NewProduct, Product, ProductCategory, ProductChanges, ProductColor, ProductError, ProductGroup, ProductImage, ProductType,
};
pub use purchase::{PurchaseError, PurchaseOrder, PurchaseOrderLine, PurchaseStatus, VendorBill};
