//! Browser/node smoke tests for the JS bindings. Run with `wasm-pack test --node`.
#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Function, Reflect};
use seekcore::wasm::RetrieverHandle;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;

/// Embeds "north*" texts as (0,1) and everything else as (1,0).
fn compass_embedder() -> Function {
    Function::new_with_args(
        "text",
        "return text.startsWith('north') ? [0, 1] : [1, 0];",
    )
}

fn doc(title: &str) -> JsValue {
    let obj = js_sys::Object::new();
    Reflect::set(&obj, &"title".into(), &title.into()).unwrap();
    Reflect::set(&obj, &"content".into(), &"".into()).unwrap();
    obj.into()
}

fn status(value: &JsValue) -> String {
    Reflect::get(value, &"status".into()).unwrap().as_string().unwrap()
}

#[wasm_bindgen_test]
fn retrieve_before_load_fails() {
    let handle = RetrieverHandle::new(compass_embedder());
    assert!(!handle.is_ready());
    assert!(handle.retrieve("east", JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn load_and_retrieve() {
    let handle = RetrieverHandle::new(compass_embedder());
    let docs = Array::of2(&doc("east gate"), &doc("north tower"));
    handle.load_corpus(docs.into()).unwrap();
    assert!(handle.is_ready());

    let out = handle.retrieve("eastern road", JsValue::UNDEFINED).unwrap();
    assert_eq!(status(&out), "matches");
    let results: Array = Reflect::get(&out, &"results".into()).unwrap().into();
    assert_eq!(results.length(), 1);

    // Each result is a plain object with document fields beside the score
    let top = results.get(0);
    assert!(!top.is_instance_of::<js_sys::Map>());
    let title = Reflect::get(&top, &"title".into()).unwrap();
    assert_eq!(title.as_string().as_deref(), Some("east gate"));
    let score = Reflect::get(&top, &"score".into()).unwrap().as_f64().unwrap();
    assert!((score - 1.0).abs() < 1e-6);
}

#[wasm_bindgen_test]
fn stats_are_plain_objects() {
    let handle = RetrieverHandle::new(compass_embedder());
    handle.load_corpus(Array::of1(&doc("east gate")).into()).unwrap();

    let stats = handle.get_stats();
    let total = Reflect::get(&stats, &"total_documents".into()).unwrap();
    assert_eq!(total.as_f64(), Some(1.0));
}

#[wasm_bindgen_test]
fn dropped_handle_releases_embedder() {
    let first = RetrieverHandle::new(compass_embedder());
    first.load_corpus(Array::of1(&doc("north tower")).into()).unwrap();
    drop(first);

    let second = RetrieverHandle::new(compass_embedder());
    second.load_corpus(Array::of1(&doc("east gate")).into()).unwrap();
    let out = second.retrieve("east", JsValue::UNDEFINED).unwrap();
    assert_eq!(status(&out), "matches");
}

#[wasm_bindgen_test]
fn add_document_and_no_match() {
    let handle = RetrieverHandle::new(compass_embedder());
    assert_eq!(handle.add_document(doc("north tower")).unwrap(), 0);

    let out = handle.retrieve("east", JsValue::UNDEFINED).unwrap();
    assert_eq!(status(&out), "no_match");
}
