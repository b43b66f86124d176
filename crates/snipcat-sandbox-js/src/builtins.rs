//! Stub host bindings installed into every scope.
//!
//! Each JS-backed binding is a factory function evaluated once per scope and
//! called with the scope hooks and the binding's JSON configuration. The
//! returned object's properties are registered as globals. The hooks object
//! itself is never reachable from snippet code.

use boa_engine::property::Attribute;
use boa_engine::{Context, JsNativeError, JsObject, JsResult, JsString, JsValue, Source};
use serde::Deserialize;
use serde_json::Value;

use snipcat_types::{LogLevel, LogLine, StubBinding};

/// Console capture and value rendering, closed over the pristine `JSON`.
/// Called with the per-snippet log budget in characters; lines past the
/// budget are dropped and the drain reports the overflow.
const HOOKS_PRELUDE: &str = r#"
(function(limit) {
    var stringify = JSON.stringify;
    var logs = [];
    var size = 0;
    var overflowed = false;
    function format(value) {
        if (typeof value === 'string') return value;
        if (value instanceof Error) return String(value);
        if (typeof value === 'function') return '[Function: ' + (value.name || 'anonymous') + ']';
        if (value !== null && typeof value === 'object') {
            try {
                var text = stringify(value);
                if (text !== undefined) return text;
            } catch (e) {}
        }
        return String(value);
    }
    return {
        record: function(level, args) {
            if (overflowed) return;
            var parts = [];
            for (var i = 0; i < args.length; i++) {
                parts.push(format(args[i]));
            }
            var line = parts.join(' ');
            size += line.length;
            if (size > limit) {
                overflowed = true;
                return;
            }
            logs.push([level, line]);
        },
        drain: function() {
            var out = { lines: logs, overflowed: overflowed };
            logs = [];
            size = 0;
            overflowed = false;
            return stringify(out);
        },
        render: function(value) {
            try { return stringify(value); } catch (e) { return undefined; }
        }
    };
})
"#;

const CONSOLE_FACTORY: &str = r#"
(function(hooks) {
    function emit(level) {
        return function() { hooks.record(level, arguments); };
    }
    return {
        console: {
            log: emit('log'),
            info: emit('info'),
            warn: emit('warn'),
            error: emit('error'),
            debug: emit('debug')
        }
    };
})
"#;

const FETCH_FACTORY: &str = r#"
(function(hooks, config) {
    var bodyText = JSON.stringify(config.body);
    return {
        fetch: function(url) {
            if (config.reject_with !== null && config.reject_with !== undefined) {
                return Promise.reject(new TypeError(config.reject_with));
            }
            var status = config.status;
            return Promise.resolve({
                url: String(url),
                status: status,
                ok: status >= 200 && status < 300,
                headers: { get: function() { return null; } },
                json: function() { return Promise.resolve(JSON.parse(bodyText)); },
                text: function() { return Promise.resolve(bodyText); }
            });
        }
    };
})
"#;

const DOCUMENT_FACTORY: &str = r#"
(function(hooks) {
    function Element(tagName) {
        this.tagName = String(tagName).toUpperCase();
        this.id = '';
        this.className = '';
        this.textContent = '';
        this.children = [];
        this.parentNode = null;
        this.attributes = {};
        this.style = {};
        this.listeners = {};
    }
    function walk(node, predicate) {
        for (var i = 0; i < node.children.length; i++) {
            var child = node.children[i];
            if (predicate(child)) return child;
            var found = walk(child, predicate);
            if (found) return found;
        }
        return null;
    }
    function collect(node, predicate, out) {
        for (var i = 0; i < node.children.length; i++) {
            var child = node.children[i];
            if (predicate(child)) out.push(child);
            collect(child, predicate, out);
        }
        return out;
    }
    Element.prototype.appendChild = function(child) {
        if (child.parentNode) child.parentNode.removeChild(child);
        child.parentNode = this;
        this.children.push(child);
        return child;
    };
    Element.prototype.removeChild = function(child) {
        var index = this.children.indexOf(child);
        if (index < 0) throw new Error('NotFoundError: node is not a child of this element');
        this.children.splice(index, 1);
        child.parentNode = null;
        return child;
    };
    Element.prototype.setAttribute = function(name, value) {
        value = String(value);
        this.attributes[name] = value;
        if (name === 'id') this.id = value;
        if (name === 'class') this.className = value;
    };
    Element.prototype.getAttribute = function(name) {
        if (name === 'id') return this.id || null;
        if (name === 'class') return this.className || null;
        return Object.prototype.hasOwnProperty.call(this.attributes, name) ? this.attributes[name] : null;
    };
    Element.prototype.addEventListener = function(type, listener) {
        (this.listeners[type] = this.listeners[type] || []).push(listener);
    };
    Element.prototype.removeEventListener = function(type, listener) {
        var list = this.listeners[type] || [];
        var index = list.indexOf(listener);
        if (index >= 0) list.splice(index, 1);
    };
    Element.prototype.dispatchEvent = function(event) {
        if (typeof event === 'string') event = { type: event };
        event.target = event.target || this;
        var list = (this.listeners[event.type] || []).slice();
        for (var i = 0; i < list.length; i++) list[i].call(this, event);
        return true;
    };
    Element.prototype.click = function() {
        return this.dispatchEvent({ type: 'click' });
    };
    Element.prototype.matches = function(selector) {
        selector = String(selector);
        if (selector.charAt(0) === '#') return this.id === selector.slice(1);
        if (selector.charAt(0) === '.') {
            return (' ' + this.className + ' ').indexOf(' ' + selector.slice(1) + ' ') >= 0;
        }
        return this.tagName === selector.toUpperCase();
    };
    Element.prototype.querySelector = function(selector) {
        return walk(this, function(node) { return node.matches(selector); });
    };
    Element.prototype.querySelectorAll = function(selector) {
        return collect(this, function(node) { return node.matches(selector); }, []);
    };

    var root = new Element('html');
    var head = root.appendChild(new Element('head'));
    var body = root.appendChild(new Element('body'));
    return {
        document: {
            documentElement: root,
            head: head,
            body: body,
            createElement: function(tagName) { return new Element(tagName); },
            getElementById: function(id) {
                return walk(root, function(node) { return node.id === String(id); });
            },
            querySelector: function(selector) { return root.querySelector(selector); },
            querySelectorAll: function(selector) { return root.querySelectorAll(selector); },
            addEventListener: function(type, listener) { root.addEventListener(type, listener); }
        }
    };
})
"#;

const TIMERS_FACTORY: &str = r#"
(function(hooks) {
    var nextId = 0;
    var cancelled = {};
    return {
        setTimeout: function(callback) {
            var id = ++nextId;
            var args = Array.prototype.slice.call(arguments, 2);
            Promise.resolve().then(function() {
                if (!cancelled[id] && typeof callback === 'function') callback.apply(undefined, args);
            });
            return id;
        },
        clearTimeout: function(id) {
            cancelled[id] = true;
        }
    };
})
"#;

/// Host-side handles into a scope's prelude.
pub(crate) struct ScopeHooks {
    hooks: JsObject,
    drain: JsObject,
    render: JsObject,
}

/// Console lines drained after a snippet.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct CapturedLogs {
    pub lines: Vec<LogLine>,
    /// Lines were dropped because the log budget ran out.
    pub overflowed: bool,
}

impl CapturedLogs {
    pub fn byte_len(&self) -> usize {
        self.lines.iter().map(|l| l.message.len()).sum()
    }
}

#[derive(Deserialize)]
struct DrainedLogs {
    lines: Vec<(String, String)>,
    overflowed: bool,
}

/// Install the prelude and every configured binding into `context`.
/// `log_limit` bounds the console text kept per snippet.
pub(crate) fn register_all(
    context: &mut Context,
    bindings: &[StubBinding],
    log_limit: usize,
) -> JsResult<ScopeHooks> {
    let prelude = eval_object(context, HOOKS_PRELUDE)?;
    let hooks = prelude
        .call(&JsValue::undefined(), &[JsValue::from(log_limit as f64)], context)?
        .as_object()
        .cloned()
        .ok_or_else(|| JsNativeError::typ().with_message("prelude did not return an object"))?;
    let drain = get_object(&hooks, "drain", context)?;
    let render = get_object(&hooks, "render", context)?;
    let scope_hooks = ScopeHooks { hooks, drain, render };

    for binding in bindings {
        register_binding(context, &scope_hooks, binding)?;
    }
    Ok(scope_hooks)
}

fn register_binding(
    context: &mut Context,
    hooks: &ScopeHooks,
    binding: &StubBinding,
) -> JsResult<()> {
    let factory = match binding {
        StubBinding::Console => CONSOLE_FACTORY,
        StubBinding::Fetch { .. } => FETCH_FACTORY,
        StubBinding::Document => DOCUMENT_FACTORY,
        StubBinding::Timers => TIMERS_FACTORY,
        StubBinding::Global { name, value } => return register_global_value(context, name, value),
    };

    let config = serde_json::to_value(binding)
        .map_err(|e| JsNativeError::typ().with_message(format!("invalid binding config: {}", e)))?;
    let config = JsValue::from_json(&config, context)?;
    let factory = eval_object(context, factory)?;
    let exports = factory.call(
        &JsValue::undefined(),
        &[JsValue::from(hooks.hooks.clone()), config],
        context,
    )?;
    let exports = exports.as_object().cloned().ok_or_else(|| {
        JsNativeError::typ().with_message("binding factory did not return an object")
    })?;

    for name in binding.identifiers() {
        let value = exports.get(JsString::from(name), context)?;
        context.register_global_property(JsString::from(name), value, Attribute::all())?;
    }
    Ok(())
}

fn register_global_value(context: &mut Context, name: &str, value: &Value) -> JsResult<()> {
    let value = JsValue::from_json(value, context)?;
    context.register_global_property(JsString::from(name), value, Attribute::all())?;
    Ok(())
}

/// Take every console line recorded since the last drain.
pub(crate) fn drain_console(context: &mut Context, hooks: &ScopeHooks) -> CapturedLogs {
    let drained = hooks
        .drain
        .call(&JsValue::undefined(), &[], context)
        .ok()
        .and_then(|v| v.as_string().map(|s| s.to_std_string_escaped()));

    let Some(text) = drained else {
        return CapturedLogs::default();
    };
    match serde_json::from_str::<DrainedLogs>(&text) {
        Ok(drained) => CapturedLogs {
            lines: drained
                .lines
                .into_iter()
                .map(|(level, message)| LogLine::new(LogLevel::parse(&level), message))
                .collect(),
            overflowed: drained.overflowed,
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to decode captured console lines");
            CapturedLogs::default()
        }
    }
}

/// Render a completion value as JSON, falling back to its display text for
/// values JSON cannot represent. `undefined` has no rendering.
pub(crate) fn render_value(context: &mut Context, hooks: &ScopeHooks, value: &JsValue) -> Option<Value> {
    if value.is_undefined() {
        return None;
    }
    let rendered = hooks
        .render
        .call(&JsValue::undefined(), &[value.clone()], context)
        .ok()
        .and_then(|v| v.as_string().map(|s| s.to_std_string_escaped()))
        .and_then(|text| serde_json::from_str::<Value>(&text).ok());

    Some(rendered.unwrap_or_else(|| Value::String(value.display().to_string())))
}

fn eval_object(context: &mut Context, code: &str) -> JsResult<JsObject> {
    let value = context.eval(Source::from_bytes(code))?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| JsNativeError::typ().with_message("prelude did not evaluate to an object").into())
}

fn get_object(object: &JsObject, key: &str, context: &mut Context) -> JsResult<JsObject> {
    object
        .get(JsString::from(key), context)?
        .as_object()
        .cloned()
        .ok_or_else(|| {
            JsNativeError::typ()
                .with_message(format!("prelude hook `{}` is missing", key))
                .into()
        })
}
