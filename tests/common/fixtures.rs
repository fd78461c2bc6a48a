//! Graph fixtures for integration tests.
#![allow(dead_code)]

use archrole::app::dto::GraphDocument;
use archrole::domain::builder::GraphBuilder;
use archrole::domain::graph::FactGraph;
use archrole::domain::node::{FieldNode, MethodNode, Parameter, TypeForm, TypeNode, TypeRef};

pub fn ty(name: &str, form: TypeForm) -> TypeNode {
    TypeNode::new(name, form).unwrap()
}

pub fn field(owner: &str, name: &str, field_type: TypeRef) -> FieldNode {
    FieldNode::new(owner, name, field_type).unwrap()
}

pub fn method(owner: &str, name: &str, return_type: TypeRef, params: &[(&str, TypeRef)]) -> MethodNode {
    let params = params
        .iter()
        .map(|(n, t)| Parameter::new(*n, t.clone()))
        .collect();
    MethodNode::new(owner, name, return_type, params).unwrap()
}

pub fn list_of(element: &str) -> TypeRef {
    TypeRef::generic("java.util.List", vec![TypeRef::new(element)])
}

pub fn optional_of(element: &str) -> TypeRef {
    TypeRef::generic("java.util.Optional", vec![TypeRef::new(element)])
}

/// A small ordering domain:
///
/// - `Order` (aggregate, id `OrderId`, lines, shipping `Address`)
/// - `OrderLine` (entity held in a list)
/// - `OrderId` (single value record), `Address` (record)
/// - `OrderRepository` (uses `Order` and `OrderId` in signatures)
/// - `OrderPlacedEvent`, `PlaceOrderUseCase`, `OrderApplicationService`
/// - `PaymentGateway`, `PricingService`
pub fn shop_builder() -> GraphBuilder {
    let mut b = GraphBuilder::new();
    for (name, form) in [
        ("shop.Order", TypeForm::Class),
        ("shop.OrderLine", TypeForm::Class),
        ("shop.OrderId", TypeForm::Record),
        ("shop.Address", TypeForm::Record),
        ("shop.OrderRepository", TypeForm::Interface),
        ("shop.OrderPlacedEvent", TypeForm::Record),
        ("shop.PlaceOrderUseCase", TypeForm::Interface),
        ("shop.PaymentGateway", TypeForm::Interface),
        ("shop.PricingService", TypeForm::Class),
    ] {
        b.add_node(ty(name, form)).unwrap();
    }
    b.add_node(
        ty("shop.OrderApplicationService", TypeForm::Class)
            .with_interfaces([TypeRef::new("shop.PlaceOrderUseCase")]),
    )
    .unwrap();

    b.add_node(field("shop.OrderId", "value", TypeRef::new("java.util.UUID"))).unwrap();
    b.add_node(field("shop.Order", "id", TypeRef::new("shop.OrderId"))).unwrap();
    b.add_node(field("shop.Order", "lines", list_of("shop.OrderLine"))).unwrap();
    b.add_node(field("shop.Order", "shipping", TypeRef::new("shop.Address"))).unwrap();
    b.add_node(field("shop.OrderLine", "id", TypeRef::new("java.lang.Long"))).unwrap();
    b.add_node(field("shop.OrderLine", "quantity", TypeRef::new("int"))).unwrap();
    b.add_node(field("shop.Address", "street", TypeRef::new("java.lang.String"))).unwrap();
    b.add_node(field("shop.OrderPlacedEvent", "orderId", TypeRef::new("shop.OrderId"))).unwrap();
    b.add_node(field(
        "shop.OrderApplicationService",
        "orders",
        TypeRef::new("shop.OrderRepository"),
    ))
    .unwrap();
    b.add_node(method(
        "shop.OrderRepository",
        "save",
        TypeRef::void(),
        &[("order", TypeRef::new("shop.Order"))],
    ))
    .unwrap();
    b.add_node(method(
        "shop.OrderRepository",
        "findById",
        optional_of("shop.Order"),
        &[("id", TypeRef::new("shop.OrderId"))],
    ))
    .unwrap();
    b.add_node(method(
        "shop.PlaceOrderUseCase",
        "place",
        TypeRef::new("shop.OrderId"),
        &[("shipping", TypeRef::new("shop.Address"))],
    ))
    .unwrap();
    b.add_node(method("shop.PaymentGateway", "charge", TypeRef::new("boolean"), &[])).unwrap();
    b.add_node(method("shop.PricingService", "price", TypeRef::new("long"), &[])).unwrap();
    b
}

pub fn shop_graph() -> FactGraph {
    let mut b = shop_builder();
    b.link_structural_edges().unwrap();
    b.compute_derived_edges().unwrap();
    b.freeze()
}

/// Types `a.A -> a.B -> a.C -> a.A` plus `a.D -> a.A`, as a graph document.
pub const TRIANGLE_DOCUMENT: &str = r#"{
  "types": [
    {"name": "a.A", "form": "class"},
    {"name": "a.B", "form": "class"},
    {"name": "a.C", "form": "class"},
    {"name": "a.D", "form": "class"}
  ],
  "edges": [
    {"from": "a.A", "to": "a.B", "kind": "references"},
    {"from": "a.B", "to": "a.C", "kind": "references"},
    {"from": "a.C", "to": "a.A", "kind": "references"},
    {"from": "a.D", "to": "a.A", "kind": "references"}
  ]
}"#;

pub fn triangle_document() -> GraphDocument {
    GraphDocument::from_json_str(TRIANGLE_DOCUMENT).unwrap()
}

/// The ordering domain as a graph document.
pub const SHOP_DOCUMENT: &str = r#"{
  "types": [
    {
      "name": "shop.Order", "form": "class",
      "fields": [
        {"name": "id", "type": {"qualified_name": "shop.OrderId"}, "modifiers": ["private", "final"]},
        {"name": "lines", "type": {"qualified_name": "java.util.List", "arguments": [{"qualified_name": "shop.OrderLine"}]}}
      ]
    },
    {
      "name": "shop.OrderLine", "form": "class",
      "fields": [{"name": "id", "type": {"qualified_name": "long"}}]
    },
    {
      "name": "shop.OrderId", "form": "record",
      "fields": [{"name": "value", "type": {"qualified_name": "java.util.UUID"}}]
    },
    {
      "name": "shop.OrderRepository", "form": "interface",
      "methods": [
        {"name": "save", "parameters": [{"name": "order", "type": {"qualified_name": "shop.Order"}}]}
      ]
    },
    {
      "name": "shop.ShippingGateway", "form": "interface",
      "methods": [{"name": "ship", "return_type": {"qualified_name": "boolean"}}]
    },
    {"name": "shop.OrderShippedEvent", "form": "record", "annotations": ["org.jmolecules.event.annotation.DomainEvent"]},
    {"name": "shop.Util", "form": "class"}
  ]
}"#;
