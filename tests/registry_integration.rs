//! Registry integration tests: registration, typed and text calls, help.

use comconsole::com::{ComError, ComInterfaceProvider, ParamKind, Registry, SignatureTag};
use glam::{DVec2, IVec2};
use std::sync::Arc;

// =============================================================================
// Helpers
// =============================================================================

struct Geometry;

impl ComInterfaceProvider for Geometry {
    fn register_functions(&self, registry: &Registry) -> Result<(), ComError> {
        registry.register(
            "cell",
            |i: i32| IVec2::new(i % 4, i / 4),
            "Grid cell of a linear index",
            vec![(ParamKind::Int, "Index".into())],
            "geometry",
        )?;
        registry.register(
            "label",
            |v: DVec2, name: String| -> DVec2 {
                let _ = name;
                v
            },
            "Echoes a point",
            vec![(ParamKind::Vec2Dbl, "Point".into()), (ParamKind::String, "Name".into())],
            "geometry",
        )?;
        registry.register(
            "isEven",
            |n: i32| n % 2 == 0,
            "Parity check",
            vec![(ParamKind::Int, "Number".into())],
            "geometry",
        )?;
        registry.register_event(
            "cell_changed",
            vec![(ParamKind::Vec2Int, "New cell".into())],
            "geometry",
        );
        Ok(())
    }
}

fn registry() -> Registry {
    let registry = Registry::new();
    Geometry.register_functions(&registry).unwrap();
    registry
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn provider_registers_signatures() {
    let registry = registry();
    assert_eq!(registry.signature("cell"), Some(SignatureTag::Vec2IntInt));
    assert_eq!(registry.signature("label"), Some(SignatureTag::Vec2DblString));
    assert_eq!(registry.signature("isEven"), Some(SignatureTag::BoolInt));
    assert_eq!(registry.signature("missing"), None);
}

#[test]
fn unsupported_shape_is_rejected() {
    let registry = Registry::new();
    let err = registry
        .register("four", |_: i32, _: i32, _: i32| {}, "", vec![], "")
        .unwrap_err();
    assert_eq!(err, ComError::UnsupportedSignature("<none>(<int>, <int>, <int>)".into()));
}

// =============================================================================
// Calls
// =============================================================================

#[test]
fn typed_and_text_calls_agree() {
    let registry = registry();
    assert_eq!(registry.call::<IVec2, _>("cell", (6,)), IVec2::new(2, 1));
    assert_eq!(registry.call_text("cell 6").unwrap(), "2 1");
    assert!(registry.call::<bool, _>("isEven", (4,)));
    assert_eq!(registry.call_text("isEven 3").unwrap(), "false");
}

#[test]
fn text_call_parses_vector_and_string() {
    let registry = registry();
    assert_eq!(registry.call_text("label 0.5 -1 home").unwrap(), "0.5 -1");
    assert!(matches!(
        registry.call_text("label 0.5 home"),
        Err(ComError::ParamError(_))
    ));
}

#[test]
fn typed_call_with_wrong_types_is_mismatch() {
    let registry = registry();
    let err = registry.try_call::<DVec2, _>("cell", (6,)).unwrap_err();
    match err {
        ComError::SignatureMismatch { name, registered, .. } => {
            assert_eq!(name, "cell");
            assert_eq!(registered, "VEC2INT_INT");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
#[should_panic(expected = "Signature mismatch")]
fn call_panics_on_mismatch() {
    let registry = registry();
    let _: f64 = registry.call("cell", (6,));
}

#[test]
fn registry_is_shared_across_threads() {
    let registry = Arc::new(registry());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.call::<IVec2, _>("cell", (i,)))
        })
        .collect();
    let cells: Vec<IVec2> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(cells[3], IVec2::new(3, 0));
}

// =============================================================================
// Introspection
// =============================================================================

#[test]
fn help_lists_functions_and_events() {
    let registry = registry();
    let names = registry.call_text("help 0").unwrap();
    assert_eq!(names, "cell\nhelp\nisEven\nlabel\n");

    let detailed = registry.call_text("help 1").unwrap();
    assert!(detailed.contains("Command: cell (geometry)\n- Description: Grid cell of a linear index\n- Params: <int> Index\n"));
    assert!(detailed.contains("- Params: <vec2dbl> Point\n- Params: <string> Name\n"));
    assert!(detailed.contains("Event: cell_changed (geometry)\n- Params: <vec2int> New cell\n"));
}

#[test]
fn domains_include_system_and_provider() {
    let registry = registry();
    assert_eq!(registry.domains(), vec!["geometry", "system"]);
    assert_eq!(registry.functions_in_domain("system"), vec!["help"]);
}
