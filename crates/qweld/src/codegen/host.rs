//! Host-side (Rust) code generator
//!
//! Generates the glue a host crate `include!`s next to the declaring type:
//! the `extern "C"` declarations of the native accessors, the exported
//! trampolines the native class calls into, and an `impl` block with property
//! accessors, signal emitters and the QML registration helper.
//!
//! Every path in the output is fully qualified so the file can be included in
//! any module of the host crate.

use crate::codegen::symbols::{CodegenOptions, NativeSymbols, OutputNames};
use crate::ir::{BindingSchema, Member, Ownership, SemanticType, Signal, Slot};

const C_VOID: &str = "*mut ::std::ffi::c_void";

/// Generator for the host glue of one schema
pub struct HostEmitter<'a> {
    schema: &'a BindingSchema,
    symbols: &'a NativeSymbols,
    runtime: String,
    file_name: String,
}

impl<'a> HostEmitter<'a> {
    /// Create a new host emitter
    pub fn new(schema: &'a BindingSchema, symbols: &'a NativeSymbols, options: &CodegenOptions) -> Self {
        Self {
            schema,
            symbols,
            runtime: options.runtime_path(),
            file_name: OutputNames::new(schema, options).host,
        }
    }

    /// Full path of the host type (`crate::app::Counter`)
    fn host_type(&self) -> String {
        format!("{}::{}", self.schema.module_path, self.schema.name)
    }

    /// Generate the complete host glue
    pub fn generate(&self) -> String {
        let mut output = String::new();

        output.push_str("// Code generated by qweld. DO NOT EDIT.\n");
        output.push_str(&format!(
            "//\n// Include from the module declaring `{}`:\n// include!(\"{}\");\n\n",
            self.schema.name, self.file_name
        ));

        output.push_str(&self.generate_extern_block());
        output.push('\n');

        output.push_str(&self.generate_constructor());
        output.push('\n');
        output.push_str(&self.generate_destroy());

        for slot in &self.schema.slots {
            output.push('\n');
            output.push_str(&self.generate_slot(slot));
        }

        output.push('\n');
        output.push_str(&self.generate_impl());

        output
    }

    /// `extern "C"` declarations of the native accessors
    fn generate_extern_block(&self) -> String {
        let mut output = String::new();
        output.push_str("#[allow(non_snake_case)]\nextern \"C\" {\n");

        for property in &self.schema.properties {
            let Some(symbols) = self.symbols.property(&property.name) else {
                continue;
            };
            let repr = host_repr(property.ty);
            output.push_str(&format!("    fn {}(ptr: {}) -> {};\n", symbols.getter, C_VOID, repr));
            output.push_str(&format!("    fn {}(ptr: {}, value: {});\n", symbols.setter, C_VOID, repr));
        }

        for signal in &self.schema.signals {
            let Some(symbol) = self.symbols.signal(&signal.name) else {
                continue;
            };
            output.push_str(&format!(
                "    fn {}({});\n",
                symbol.emitter,
                shim_params(&signal.params)
            ));
        }

        output.push_str(&format!(
            "    fn {}(uri: *mut ::std::ffi::c_char, version_major: ::std::ffi::c_int, version_minor: ::std::ffi::c_int, qml_name: *mut ::std::ffi::c_char);\n",
            self.symbols.register
        ));
        output.push_str("}\n");

        output
    }

    /// Trampoline run right after the native object is constructed
    fn generate_constructor(&self) -> String {
        let runtime = &self.runtime;
        let host_type = self.host_type();
        let mut output = String::new();

        output.push_str("#[no_mangle]\n");
        output.push_str(&format!(
            "pub extern \"C\" fn {}(ptr: {}) {{\n",
            self.symbols.constructor, C_VOID
        ));
        output.push_str(&format!("    let handle = {}::Handle::from_ptr(ptr);\n", runtime));
        output.push_str("    if handle.is_null() {\n        return;\n    }\n");
        output.push_str(&format!(
            "    let mut object = <{} as ::std::default::Default>::default();\n",
            host_type
        ));
        output.push_str(&format!(
            "    {}::Bindable::qml_object_mut(&mut object).attach(handle);\n",
            runtime
        ));
        output.push_str(&format!("    {}::register(handle, object);\n", runtime));

        if let Some(constructor) = &self.schema.constructor {
            output.push_str(&format!(
                "    if let Some(mut guard) = {}::borrow(handle) {{\n",
                runtime
            ));
            output.push_str(&format!(
                "        if let Some(object) = guard.downcast_mut::<{}>() {{\n",
                host_type
            ));
            output.push_str(&format!("            object.{}();\n", constructor.host_name()));
            output.push_str("        }\n    }\n");
        }

        output.push_str("}\n");
        output
    }

    /// Trampoline run from the native destructor
    fn generate_destroy(&self) -> String {
        format!(
            "#[no_mangle]\npub extern \"C\" fn {}(ptr: {}) {{\n    {}::deregister({}::Handle::from_ptr(ptr));\n}}\n",
            self.symbols.destroy, C_VOID, self.runtime, self.runtime
        )
    }

    /// Trampoline dispatching a slot to the host object
    fn generate_slot(&self, slot: &Slot) -> String {
        let runtime = &self.runtime;
        let trampoline = self
            .symbols
            .slot(&slot.name)
            .map(|s| s.trampoline.as_str())
            .unwrap_or_default();
        let zero = slot
            .returns
            .map(|ty| format!(" {}", ty.mapping().shim_zero))
            .unwrap_or_default();
        let mut output = String::new();

        output.push_str("#[no_mangle]\n");
        output.push_str(&format!(
            "pub extern \"C\" fn {}({}){} {{\n",
            trampoline,
            shim_params(&slot.params),
            slot.returns
                .map(|ty| format!(" -> {}", host_repr(ty)))
                .unwrap_or_default()
        ));

        output.push_str(&format!(
            "    let Some(mut guard) = {}::borrow({}::Handle::from_ptr(ptr)) else {{\n        return{};\n    }};\n",
            runtime, runtime, zero
        ));
        output.push_str(&format!(
            "    let Some(object) = guard.downcast_mut::<{}>() else {{\n        return{};\n    }};\n",
            self.host_type(),
            zero
        ));

        for param in &slot.params {
            let name = param.host_name();
            output.push_str(&format!(
                "    let {} = {};\n",
                name,
                param.ty.mapping().shim_to_host(runtime, &name)
            ));
        }

        let args: Vec<String> = slot.params.iter().map(Member::host_name).collect();
        let call = format!("object.{}({})", slot.host_name(), args.join(", "));

        match slot.returns {
            None => output.push_str(&format!("    {};\n", call)),
            Some(ty) => {
                output.push_str(&format!("    let result = {};\n", call));
                output.push_str(&format!("    {}\n", ty.mapping().host_to_shim(runtime, "result")));
            }
        }

        output.push_str("}\n");
        output
    }

    /// `impl` block with property accessors, signal emitters and registration
    fn generate_impl(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("impl {} {{\n", self.host_type()));

        for property in &self.schema.properties {
            output.push_str(&self.generate_getter(property));
            output.push('\n');
            output.push_str(&self.generate_setter(property));
            output.push('\n');
        }

        for signal in &self.schema.signals {
            output.push_str(&self.generate_signal(signal));
            output.push('\n');
        }

        output.push_str(&self.generate_register());
        output.push_str("}\n");
        output
    }

    /// Lines resolving the handle and returning early when it is not live
    fn live_handle(&self, early: &str) -> String {
        format!(
            "        let handle = <Self as {}::Bindable>::handle(self);\n        if !{}::contains(handle) {{\n            return{};\n        }}\n",
            self.runtime, self.runtime, early
        )
    }

    fn generate_getter(&self, property: &Member) -> String {
        let getter = self
            .symbols
            .property(&property.name)
            .map(|p| p.getter.as_str())
            .unwrap_or_default();
        let host = host_type(property.ty);
        let mut output = String::new();

        output.push_str(&format!(
            "    /// Returns `{}` as stored by the native object.\n",
            property.name
        ));
        output.push_str(&format!("    pub fn {}(&self) -> {} {{\n", property.host_name(), host));
        output.push_str(&self.live_handle(&format!(" <{} as ::std::default::Default>::default()", host)));
        output.push_str(&format!("        let value = unsafe {{ {}(handle.as_ptr()) }};\n", getter));

        match property.ty.mapping().ownership {
            Ownership::HeapBuffer => output.push_str(&format!(
                "        unsafe {{ {}::NativeString::from_raw(value) }}.into_string()\n",
                self.runtime
            )),
            Ownership::Value => output.push_str(&format!(
                "        {}\n",
                property.ty.mapping().shim_to_host(&self.runtime, "value")
            )),
        }

        output.push_str("    }\n");
        output
    }

    fn generate_setter(&self, property: &Member) -> String {
        let setter = self
            .symbols
            .property(&property.name)
            .map(|p| p.setter.as_str())
            .unwrap_or_default();
        let mut output = String::new();

        output.push_str(&format!(
            "    /// Sets `{}` on the native object, which notifies QML when it changes.\n",
            property.name
        ));
        output.push_str(&format!(
            "    pub fn set_{}(&self, value: {}) {{\n",
            property.host_name(),
            host_type(property.ty)
        ));
        output.push_str(&self.live_handle(""));

        let arg = self.marshal_arg(&mut output, "value", property.ty);
        output.push_str(&format!("        unsafe {{ {}(handle.as_ptr(), {}) }}\n", setter, arg));
        output.push_str("    }\n");
        output
    }

    fn generate_signal(&self, signal: &Signal) -> String {
        let emitter = self
            .symbols
            .signal(&signal.name)
            .map(|s| s.emitter.as_str())
            .unwrap_or_default();
        let params: Vec<String> = signal
            .params
            .iter()
            .map(|p| format!("{}: {}", p.host_name(), host_type(p.ty)))
            .collect();
        let mut output = String::new();

        output.push_str(&format!("    /// Emits `{}` on the native object.\n", signal.name));
        output.push_str(&format!(
            "    pub fn {}(&self{}{}) {{\n",
            signal.host_name(),
            if params.is_empty() { "" } else { ", " },
            params.join(", ")
        ));
        output.push_str(&self.live_handle(""));

        let mut args = vec!["handle.as_ptr()".to_string()];
        for param in &signal.params {
            args.push(self.marshal_arg(&mut output, &param.host_name(), param.ty));
        }
        output.push_str(&format!("        unsafe {{ {}({}) }}\n", emitter, args.join(", ")));
        output.push_str("    }\n");
        output
    }

    fn generate_register(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "    /// Registers `{}` as a QML type named `qml_name` in module `uri`.\n",
            self.schema.class_name()
        ));
        output.push_str(
            "    pub fn register_as(uri: &str, version_major: i32, version_minor: i32, qml_name: &str) {\n",
        );
        output.push_str(&format!(
            "        let uri = {}::ShimString::new(uri);\n",
            self.runtime
        ));
        output.push_str(&format!(
            "        let qml_name = {}::ShimString::new(qml_name);\n",
            self.runtime
        ));
        output.push_str(&format!(
            "        unsafe {{ {}(uri.as_ptr(), version_major, version_minor, qml_name.as_ptr()) }}\n",
            self.symbols.register
        ));
        output.push_str("    }\n");
        output
    }

    /// Shadow a host value with its shim form and return the call argument
    ///
    /// Strings become scoped `ShimString`s freed when the method returns;
    /// everything else is converted by value.
    fn marshal_arg(&self, output: &mut String, name: &str, ty: SemanticType) -> String {
        let mapping = ty.mapping();
        match mapping.ownership {
            Ownership::HeapBuffer => {
                output.push_str(&format!(
                    "        let {} = {}::ShimString::new(&{});\n",
                    name, self.runtime, name
                ));
                format!("{}.as_ptr()", name)
            }
            Ownership::Value => {
                output.push_str(&format!(
                    "        let {} = {};\n",
                    name,
                    mapping.host_to_shim(&self.runtime, name)
                ));
                name.to_string()
            }
        }
    }
}

fn host_type(ty: SemanticType) -> &'static str {
    ty.mapping().host_type
}

fn host_repr(ty: SemanticType) -> &'static str {
    ty.mapping().host_repr
}

/// `ptr: *mut c_void, new_count: c_int`
fn shim_params(params: &[Member]) -> String {
    std::iter::once(format!("ptr: {}", C_VOID))
        .chain(
            params
                .iter()
                .map(|p| format!("{}: {}", p.host_name(), host_repr(p.ty))),
        )
        .collect::<Vec<_>>()
        .join(", ")
}
