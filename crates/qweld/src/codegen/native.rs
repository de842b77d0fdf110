//! Native-side code generator
//!
//! Generates, for one schema, a C header declaring the C-ABI accessors and
//! host trampolines, and a C++ source file holding the Qt class (with its
//! `Q_PROPERTY` declarations, signals and slots) plus the accessor bodies.
//!
//! Locals in generated code use the internal names the validator reserves
//! (`ptr`, `obj`, `result`, `value`) or carry a `_utf8` suffix, so they can
//! never shadow a user parameter.

use crate::codegen::symbols::{CodegenOptions, NativeSymbols, OutputNames};
use crate::ir::naming::upper_first;
use crate::ir::{BindingSchema, Member, SemanticType, Signal, Slot};

const QT_INCLUDES: &[&str] = &[
    "QtCore/QByteArray",
    "QtCore/QObject",
    "QtCore/QString",
    "QtQml/QQmlEngine",
];

/// Generated native artifacts of one schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeOutput {
    /// C-ABI header
    pub header: String,
    /// C++ class and accessor bodies
    pub source: String,
}

/// Generator for the C header and the C++ class
pub struct NativeEmitter<'a> {
    schema: &'a BindingSchema,
    symbols: &'a NativeSymbols,
    options: &'a CodegenOptions,
    names: OutputNames,
}

impl<'a> NativeEmitter<'a> {
    /// Create a new native emitter
    pub fn new(schema: &'a BindingSchema, symbols: &'a NativeSymbols, options: &'a CodegenOptions) -> Self {
        Self {
            schema,
            symbols,
            options,
            names: OutputNames::new(schema, options),
        }
    }

    /// Generate both native files
    pub fn generate(&self) -> NativeOutput {
        NativeOutput {
            header: self.generate_header(),
            source: self.generate_source(),
        }
    }

    /// Generate the C-ABI header
    pub fn generate_header(&self) -> String {
        let guard = self.names.header_guard();
        let mut output = String::new();

        output.push_str("// Code generated by qweld. DO NOT EDIT.\n\n");
        output.push_str(&format!("#ifndef {}\n#define {}\n\n", guard, guard));
        output.push_str("#include <stdint.h>\n#include <stdbool.h>\n\n");
        output.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");

        if !self.schema.properties.is_empty() {
            output.push_str("// Property accessors\n");
            for property in &self.schema.properties {
                output.push_str(&format!("{};\n", self.getter_signature(property)));
                output.push_str(&format!("{};\n", self.setter_signature(property)));
            }
            output.push('\n');
        }

        if !self.schema.signals.is_empty() {
            output.push_str("// Signal emitters\n");
            for signal in &self.schema.signals {
                output.push_str(&format!("{};\n", self.emitter_signature(signal)));
            }
            output.push('\n');
        }

        output.push_str("// Registration\n");
        output.push_str(&format!("{};\n\n", self.register_signature()));

        output.push_str("// Host trampolines\n");
        output.push_str(&format!("void {}(void* ptr);\n", self.symbols.constructor));
        output.push_str(&format!("void {}(void* ptr);\n", self.symbols.destroy));
        for slot in &self.schema.slots {
            output.push_str(&format!("{};\n", self.trampoline_signature(slot)));
        }
        output.push('\n');

        output.push_str("// Releases a string allocated by the host\n");
        output.push_str(&format!("void {}(char* ptr);\n\n", self.symbols.string_free));

        output.push_str("#ifdef __cplusplus\n}\n#endif\n\n");
        output.push_str(&format!("#endif // {}\n", guard));

        output
    }

    /// Generate the C++ source
    pub fn generate_source(&self) -> String {
        let mut output = String::new();

        output.push_str("// Code generated by qweld. DO NOT EDIT.\n\n");
        for include in QT_INCLUDES {
            output.push_str(&format!("#include <{}>\n", include));
        }
        if !QT_INCLUDES.contains(&self.options.base_include.as_str()) {
            output.push_str(&format!("#include <{}>\n", self.options.base_include));
        }
        output.push_str("#include <stdlib.h>\n#include <string.h>\n\n");
        output.push_str(&format!("#include \"{}\"\n\n", self.names.header));

        output.push_str(&self.generate_class());
        output.push('\n');

        for property in &self.schema.properties {
            output.push_str(&self.generate_accessors(property));
        }

        for signal in &self.schema.signals {
            output.push_str(&self.generate_emitter(signal));
        }

        output.push_str(&self.generate_register());
        output.push_str(&format!("#include \"{}\"\n", self.names.moc));

        output
    }

    /// Generate the Qt class declaration
    fn generate_class(&self) -> String {
        let class = &self.symbols.class_name;
        let base = &self.options.base_class;
        let mut output = String::new();

        output.push_str(&format!("class {} : public {}\n{{\n", class, base));
        output.push_str("    Q_OBJECT\n");
        for property in &self.schema.properties {
            output.push_str(&format!(
                "    Q_PROPERTY({} {} READ {} WRITE set{} NOTIFY {})\n",
                native_type(property.ty),
                property.name,
                property.name,
                upper_first(&property.name),
                BindingSchema::notify_name(property)
            ));
        }

        output.push_str("\npublic:\n");
        output.push_str(&format!(
            "    explicit {}({}* parent = nullptr) : {}(parent)\n    {{\n        {}(this);\n    }}\n\n",
            class, base, base, self.symbols.constructor
        ));
        output.push_str(&format!(
            "    ~{}() override\n    {{\n        {}(this);\n    }}\n",
            class, self.symbols.destroy
        ));

        for property in &self.schema.properties {
            output.push('\n');
            output.push_str(&self.generate_property_methods(property));
        }

        output.push_str("\nsignals:\n");
        for signal in &self.schema.signals {
            output.push_str(&format!(
                "    void {}({});\n",
                signal.name,
                native_params(&signal.params)
            ));
        }
        for property in &self.schema.properties {
            if self.schema.notify_signal(property).is_none() {
                output.push_str(&format!(
                    "    void {}({} {});\n",
                    BindingSchema::notify_name(property),
                    native_type(property.ty),
                    property.name
                ));
            }
        }

        if !self.schema.slots.is_empty() {
            output.push_str("\npublic slots:\n");
            for (i, slot) in self.schema.slots.iter().enumerate() {
                if i > 0 {
                    output.push('\n');
                }
                output.push_str(&self.generate_slot(slot));
            }
        }

        if !self.schema.properties.is_empty() {
            output.push_str("\nprivate:\n");
            for property in &self.schema.properties {
                output.push_str(&format!(
                    "    {} _{}{{}};\n",
                    native_type(property.ty),
                    property.name
                ));
            }
        }

        output.push_str("};\n");
        output
    }

    /// Getter and change-notifying setter inside the class
    fn generate_property_methods(&self, property: &Member) -> String {
        let ty = native_type(property.ty);
        let mut output = String::new();

        output.push_str(&format!(
            "    {} {}() const\n    {{\n        return _{};\n    }}\n\n",
            ty, property.name, property.name
        ));
        output.push_str(&format!(
            "    void set{}({} value)\n    {{\n",
            upper_first(&property.name),
            ty
        ));
        output.push_str(&format!(
            "        if (_{} == value) {{\n            return;\n        }}\n",
            property.name
        ));
        output.push_str(&format!("        _{} = value;\n", property.name));
        output.push_str(&format!(
            "        emit {}(_{});\n    }}\n",
            BindingSchema::notify_name(property),
            property.name
        ));

        output
    }

    /// Slot method forwarding to its host trampoline
    fn generate_slot(&self, slot: &Slot) -> String {
        let trampoline = self
            .symbols
            .slot(&slot.name)
            .map(|s| s.trampoline.as_str())
            .unwrap_or_default();

        let return_type = slot.returns.map(native_type).unwrap_or("void");
        let mut output = String::new();

        output.push_str(&format!(
            "    {} {}({})\n    {{\n",
            return_type,
            slot.name,
            native_params(&slot.params)
        ));

        let mut args = vec!["this".to_string()];
        for param in &slot.params {
            if param.ty.is_heap_buffer() {
                output.push_str(&format!(
                    "        QByteArray {}_utf8 = {}.toUtf8();\n",
                    param.name, param.name
                ));
                args.push(format!("{}_utf8.data()", param.name));
            } else {
                args.push(param.name.clone());
            }
        }
        let call = format!("{}({})", trampoline, args.join(", "));

        match slot.returns {
            None => output.push_str(&format!("        {};\n", call)),
            Some(ty) if ty.is_heap_buffer() => {
                output.push_str(&format!("        char* result = {};\n", call));
                output.push_str(&format!(
                    "        QString value = {};\n",
                    ty.mapping().shim_to_native("result")
                ));
                output.push_str(&format!("        {}(result);\n", self.symbols.string_free));
                output.push_str("        return value;\n");
            }
            Some(ty) => output.push_str(&format!(
                "        return {};\n",
                ty.mapping().shim_to_native(&call)
            )),
        }

        output.push_str("    }\n");
        output
    }

    /// C-ABI getter and setter bodies of a property
    fn generate_accessors(&self, property: &Member) -> String {
        let mapping = property.ty.mapping();
        let mut output = String::new();

        output.push_str(&format!("{}\n{{\n", self.getter_signature(property)));
        output.push_str(&self.cast_line());
        output.push_str(&format!(
            "    return {};\n}}\n\n",
            mapping.native_to_shim(&format!("obj->{}()", property.name))
        ));

        output.push_str(&format!("{}\n{{\n", self.setter_signature(property)));
        output.push_str(&self.cast_line());
        output.push_str(&format!(
            "    obj->set{}({});\n}}\n\n",
            upper_first(&property.name),
            mapping.shim_to_native("value")
        ));

        output
    }

    /// C-ABI signal emitter body
    fn generate_emitter(&self, signal: &Signal) -> String {
        let args: Vec<String> = signal
            .params
            .iter()
            .map(|p| p.ty.mapping().shim_to_native(&p.name))
            .collect();

        let mut output = String::new();
        output.push_str(&format!("{}\n{{\n", self.emitter_signature(signal)));
        output.push_str(&self.cast_line());
        output.push_str(&format!("    emit obj->{}({});\n}}\n\n", signal.name, args.join(", ")));
        output
    }

    /// QML type registration body
    fn generate_register(&self) -> String {
        format!(
            "{}\n{{\n    qmlRegisterType<{}>(uri, versionMajor, versionMinor, qmlName);\n}}\n\n",
            self.register_signature(),
            self.symbols.class_name
        )
    }

    fn cast_line(&self) -> String {
        format!(
            "    {}* obj = static_cast<{}*>(ptr);\n",
            self.symbols.class_name, self.symbols.class_name
        )
    }

    fn getter_signature(&self, property: &Member) -> String {
        let getter = self
            .symbols
            .property(&property.name)
            .map(|p| p.getter.as_str())
            .unwrap_or_default();
        format!("{} {}(void* ptr)", shim_type(property.ty), getter)
    }

    fn setter_signature(&self, property: &Member) -> String {
        let setter = self
            .symbols
            .property(&property.name)
            .map(|p| p.setter.as_str())
            .unwrap_or_default();
        format!("void {}(void* ptr, {} value)", setter, shim_type(property.ty))
    }

    fn emitter_signature(&self, signal: &Signal) -> String {
        let emitter = self
            .symbols
            .signal(&signal.name)
            .map(|s| s.emitter.as_str())
            .unwrap_or_default();
        format!("void {}({})", emitter, shim_params(&signal.params))
    }

    fn trampoline_signature(&self, slot: &Slot) -> String {
        let trampoline = self
            .symbols
            .slot(&slot.name)
            .map(|s| s.trampoline.as_str())
            .unwrap_or_default();
        let return_type = slot.returns.map(shim_type).unwrap_or("void");
        format!("{} {}({})", return_type, trampoline, shim_params(&slot.params))
    }

    fn register_signature(&self) -> String {
        format!(
            "void {}(char* uri, int versionMajor, int versionMinor, char* qmlName)",
            self.symbols.register
        )
    }
}

fn native_type(ty: SemanticType) -> &'static str {
    ty.mapping().native_repr
}

fn shim_type(ty: SemanticType) -> &'static str {
    ty.mapping().shim_repr
}

/// `int newCount, QString name`
fn native_params(params: &[Member]) -> String {
    params
        .iter()
        .map(|p| format!("{} {}", native_type(p.ty), p.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `void* ptr, int newCount, char* name`
fn shim_params(params: &[Member]) -> String {
    std::iter::once("void* ptr".to_string())
        .chain(params.iter().map(|p| format!("{} {}", shim_type(p.ty), p.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn counter() -> BindingSchema {
        BindingSchema::new("Counter")
            .property("count", SemanticType::Int)
            .signal(Signal::new("countChanged").param("newCount", SemanticType::Int))
            .slot(Slot::new("increment").returns(SemanticType::Int))
            .constructor("init")
    }

    fn generate(schema: &BindingSchema) -> NativeOutput {
        let options = CodegenOptions::default();
        let symbols = NativeSymbols::new(schema, &options);
        NativeEmitter::new(schema, &symbols, &options).generate()
    }

    #[test]
    fn test_counter_header() {
        let output = generate(&counter());
        let expected = r#"// Code generated by qweld. DO NOT EDIT.

#ifndef QWELD_COUNTER_H
#define QWELD_COUNTER_H

#include <stdint.h>
#include <stdbool.h>

#ifdef __cplusplus
extern "C" {
#endif

// Property accessors
int Counter_Count(void* ptr);
void Counter_SetCount(void* ptr, int value);

// Signal emitters
void Counter_CountChanged(void* ptr, int newCount);

// Registration
void Counter_RegisterType(char* uri, int versionMajor, int versionMinor, char* qmlName);

// Host trampolines
void qweld_counter_constructor(void* ptr);
void qweld_counter_destroy(void* ptr);
int qweld_counter_slot_increment(void* ptr);

// Releases a string allocated by the host
void qweld_string_free(char* ptr);

#ifdef __cplusplus
}
#endif

#endif // QWELD_COUNTER_H
"#;
        assert_eq!(output.header, expected);
    }

    #[test]
    fn test_counter_class() {
        let output = generate(&counter());
        let expected = r#"class Counter : public QQuickItem
{
    Q_OBJECT
    Q_PROPERTY(int count READ count WRITE setCount NOTIFY countChanged)

public:
    explicit Counter(QQuickItem* parent = nullptr) : QQuickItem(parent)
    {
        qweld_counter_constructor(this);
    }

    ~Counter() override
    {
        qweld_counter_destroy(this);
    }

    int count() const
    {
        return _count;
    }

    void setCount(int value)
    {
        if (_count == value) {
            return;
        }
        _count = value;
        emit countChanged(_count);
    }

signals:
    void countChanged(int newCount);

public slots:
    int increment()
    {
        return qweld_counter_slot_increment(this);
    }

private:
    int _count{};
};
"#;
        assert!(output.source.contains(expected), "{}", output.source);
        assert!(output.source.contains("#include \"qweld-counter.h\""));
        assert!(output.source.ends_with("#include \"qweld-counter.moc\"\n"));
    }

    #[test]
    fn test_counter_accessors() {
        let source = generate(&counter()).source;
        assert!(source.contains(
            "int Counter_Count(void* ptr)\n{\n    Counter* obj = static_cast<Counter*>(ptr);\n    return obj->count();\n}\n"
        ));
        assert!(source.contains(
            "void Counter_SetCount(void* ptr, int value)\n{\n    Counter* obj = static_cast<Counter*>(ptr);\n    obj->setCount(value);\n}\n"
        ));
        assert!(source.contains("    emit obj->countChanged(newCount);\n"));
        assert!(source.contains("    qmlRegisterType<Counter>(uri, versionMajor, versionMinor, qmlName);\n"));
    }

    #[test]
    fn test_string_marshaling() {
        let schema = BindingSchema::new("Greeter")
            .property("name", SemanticType::String)
            .signal(Signal::new("greeted").param("message", SemanticType::String))
            .slot(
                Slot::new("greet")
                    .param("who", SemanticType::String)
                    .param("times", SemanticType::Int64)
                    .returns(SemanticType::String),
            );
        let output = generate(&schema);

        assert!(output.header.contains("char* Greeter_Name(void* ptr);"));
        assert!(output.header.contains("void Greeter_SetName(void* ptr, char* value);"));
        assert!(output
            .header
            .contains("char* qweld_greeter_slot_greet(void* ptr, char* who, int64_t times);"));

        let slot = r#"    QString greet(QString who, qint64 times)
    {
        QByteArray who_utf8 = who.toUtf8();
        char* result = qweld_greeter_slot_greet(this, who_utf8.data(), times);
        QString value = QString::fromUtf8(result);
        qweld_string_free(result);
        return value;
    }
"#;
        assert!(output.source.contains(slot), "{}", output.source);
        assert!(output.source.contains("    return strdup(obj->name().toUtf8().constData());\n"));
        assert!(output.source.contains("    obj->setName(QString::fromUtf8(value));\n"));
        assert!(output.source.contains("    emit obj->greeted(QString::fromUtf8(message));\n"));
    }

    #[test]
    fn test_implicit_notify_signal() {
        let schema = BindingSchema::new("Flag").property("enabled", SemanticType::Bool);
        let source = generate(&schema).source;
        assert!(source.contains("Q_PROPERTY(bool enabled READ enabled WRITE setEnabled NOTIFY enabledChanged)"));
        assert!(source.contains("signals:\n    void enabledChanged(bool enabled);\n"));
        assert!(!source.contains("public slots:"));
    }

    #[test]
    fn test_custom_base_class() {
        let schema = BindingSchema::new("Model");
        let options = CodegenOptions {
            base_class: "QObject".to_string(),
            base_include: "QtCore/QObject".to_string(),
            ..CodegenOptions::default()
        };
        let symbols = NativeSymbols::new(&schema, &options);
        let source = NativeEmitter::new(&schema, &symbols, &options).generate_source();
        assert!(source.contains("class Model : public QObject\n"));
        assert!(source.contains("explicit Model(QObject* parent = nullptr) : QObject(parent)"));
        assert_eq!(source.matches("#include <QtCore/QObject>\n").count(), 1);
    }

    #[test]
    fn test_deterministic() {
        let schema = counter();
        assert_eq!(generate(&schema), generate(&schema));
    }
}
