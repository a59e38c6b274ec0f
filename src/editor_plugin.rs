use godot::classes::editor_plugin::AfterGuiInput;
use godot::classes::editor_plugin::CustomControlContainer;
use godot::classes::{
    Button, Camera3D, EditorPlugin, HSlider, IEditorPlugin, InputEvent, InputEventKey,
    InputEventMouseButton, InputEventMouseMotion, Label, MarginContainer, VBoxContainer,
    VSeparator,
};
use godot::global::{Key, MouseButton};
use godot::prelude::*;

use crate::brush::BrushTool;
use crate::input::{EditorButton, InputDisable};

#[derive(GodotClass)]
#[class(tool, init, base=EditorPlugin)]
pub struct SculptTerrainPlugin {
    base: Base<EditorPlugin>,
    #[init(val = None)]
    current_terrain: Option<Gd<Node>>,
    #[init(val = None)]
    margin_container: Option<Gd<MarginContainer>>,
    #[init(val = None)]
    toolbar: Option<Gd<VBoxContainer>>,

    #[init(val = None)]
    brush_toggle_button: Option<Gd<Button>>,
    #[init(val = [None, None, None, None])]
    tool_buttons: [Option<Gd<Button>>; 4],
    #[init(val = None)]
    brush_size_slider: Option<Gd<HSlider>>,
    #[init(val = None)]
    brush_strength_slider: Option<Gd<HSlider>>,

    #[init(val = false)]
    is_modifying: bool,
}

#[godot_api]
impl IEditorPlugin for SculptTerrainPlugin {
    fn enter_tree(&mut self) {
        godot_print!("SculptTerrainPlugin: enter_tree called");

        let mut margin_container = MarginContainer::new_alloc();
        margin_container.set_name("SculptTerrainMargin");
        margin_container.set_visible(false);
        margin_container.set_custom_minimum_size(Vector2::new(140.0, 0.0));
        margin_container.add_theme_constant_override("margin_top", 8);
        margin_container.add_theme_constant_override("margin_left", 8);
        margin_container.add_theme_constant_override("margin_right", 8);
        margin_container.add_theme_constant_override("margin_bottom", 8);

        let mut toolbar = VBoxContainer::new_alloc();
        toolbar.set_name("SculptTerrainToolbar");
        toolbar.add_theme_constant_override("separation", 4);

        // ═══════════════════════════════════════════════════════════════════
        // Tool Section
        // ═══════════════════════════════════════════════════════════════════
        let mut sculpt_label = Label::new_alloc();
        sculpt_label.set_text("Sculpt");
        toolbar.add_child(&sculpt_label);

        let mut brush_toggle_button = Button::new_alloc();
        brush_toggle_button.set_text("Enable Brush (B)");
        brush_toggle_button.set_toggle_mode(true);
        brush_toggle_button.set_pressed(true);
        brush_toggle_button.set_custom_minimum_size(Vector2::new(100.0, 28.0));
        toolbar.add_child(&brush_toggle_button);

        let tooltips = [
            "Raise (1) - LMB raises, RMB lowers",
            "Flatten (2) - Hold LMB to level at the height under the first click",
            "Smooth (3) - Hold LMB to even out bumps, across tile seams",
            "Ramp (4) - Not implemented",
        ];
        let mut tool_buttons: [Option<Gd<Button>>; 4] = [None, None, None, None];
        for (i, tool) in BrushTool::ALL.iter().enumerate() {
            let mut button = Button::new_alloc();
            button.set_text(tool.name());
            button.set_toggle_mode(true);
            button.set_pressed(i == 0);
            button.set_custom_minimum_size(Vector2::new(100.0, 28.0));
            button.set_tooltip_text(tooltips[i]);
            toolbar.add_child(&button);
            tool_buttons[i] = Some(button);
        }

        // ═══════════════════════════════════════════════════════════════════
        // Brush Section
        // ═══════════════════════════════════════════════════════════════════
        let mut sep = VSeparator::new_alloc();
        sep.set_custom_minimum_size(Vector2::new(0.0, 8.0));
        toolbar.add_child(&sep);

        let mut size_label = Label::new_alloc();
        size_label.set_text("Size:");
        toolbar.add_child(&size_label);

        let mut brush_size_slider = HSlider::new_alloc();
        brush_size_slider.set_min(0.0);
        brush_size_slider.set_max(50.0);
        brush_size_slider.set_step(0.5);
        brush_size_slider.set_value(5.0);
        brush_size_slider.set_custom_minimum_size(Vector2::new(100.0, 0.0));
        brush_size_slider.set_tooltip_text("Brush radius (hold [ / ])");
        toolbar.add_child(&brush_size_slider);

        let mut strength_label = Label::new_alloc();
        strength_label.set_text("Strength:");
        toolbar.add_child(&strength_label);

        let mut brush_strength_slider = HSlider::new_alloc();
        brush_strength_slider.set_min(1.0);
        brush_strength_slider.set_max(200.0);
        brush_strength_slider.set_step(1.0);
        brush_strength_slider.set_value(40.0);
        brush_strength_slider.set_custom_minimum_size(Vector2::new(100.0, 0.0));
        brush_strength_slider.set_tooltip_text("Raise rate per second");
        toolbar.add_child(&brush_strength_slider);

        margin_container.add_child(&toolbar);

        // ═══════════════════════════════════════════════════════════════════
        // Connect Signals
        // ═══════════════════════════════════════════════════════════════════
        let plugin_ref = self.to_gd();

        brush_toggle_button.connect(
            "toggled",
            &Callable::from_object_method(&plugin_ref, "on_brush_toggled"),
        );
        for (i, button) in tool_buttons.iter().enumerate() {
            if let Some(ref btn) = button {
                let method_name = format!("on_tool_{}_pressed", i);
                btn.clone().connect(
                    "pressed",
                    &Callable::from_object_method(&plugin_ref, &method_name),
                );
            }
        }
        brush_size_slider.connect(
            "value_changed",
            &Callable::from_object_method(&plugin_ref, "on_brush_size_changed"),
        );
        brush_strength_slider.connect(
            "value_changed",
            &Callable::from_object_method(&plugin_ref, "on_brush_strength_changed"),
        );

        // Brush input is suspended while the pointer is over the toolbar
        margin_container.connect(
            "mouse_entered",
            &Callable::from_object_method(&plugin_ref, "on_toolbar_mouse_entered"),
        );
        margin_container.connect(
            "mouse_exited",
            &Callable::from_object_method(&plugin_ref, "on_toolbar_mouse_exited"),
        );

        self.base_mut().add_control_to_container(
            CustomControlContainer::SPATIAL_EDITOR_SIDE_LEFT,
            &margin_container,
        );

        self.margin_container = Some(margin_container);
        self.toolbar = Some(toolbar);
        self.brush_toggle_button = Some(brush_toggle_button);
        self.tool_buttons = tool_buttons;
        self.brush_size_slider = Some(brush_size_slider);
        self.brush_strength_slider = Some(brush_strength_slider);

        godot_print!("SculptTerrainPlugin: toolbar added with sculpt controls");
    }

    fn exit_tree(&mut self) {
        self.brush_toggle_button = None;
        self.tool_buttons = [None, None, None, None];
        self.brush_size_slider = None;
        self.brush_strength_slider = None;
        self.toolbar = None;

        if let Some(mut margin) = self.margin_container.take() {
            self.base_mut().remove_control_from_container(
                CustomControlContainer::SPATIAL_EDITOR_SIDE_LEFT,
                &margin,
            );
            margin.queue_free();
        }
    }

    fn handles(&self, object: Gd<Object>) -> bool {
        let class_name = object.get_class();
        class_name == "SculptTerrain"
    }

    fn edit(&mut self, object: Option<Gd<Object>>) {
        if let Some(obj) = object {
            if let Ok(node) = obj.try_cast::<Node>() {
                self.current_terrain = Some(node);
                self.set_ui_visible(true);
                self.sync_ui_from_terrain();
                return;
            }
        }
        self.set_ui_visible(false)
    }

    fn make_visible(&mut self, visible: bool) {
        if !visible && self.is_modifying {
            return;
        }

        self.set_ui_visible(visible);
        if !visible {
            self.release_all_buttons();
            self.current_terrain = None;
        }
    }

    fn forward_3d_gui_input(
        &mut self,
        camera: Option<Gd<Camera3D>>,
        event: Option<Gd<InputEvent>>,
    ) -> i32 {
        let Some(event) = event else {
            return AfterGuiInput::PASS.ord();
        };

        if let Ok(key_event) = event.clone().try_cast::<InputEventKey>() {
            if key_event.is_echo() {
                return AfterGuiInput::PASS.ord();
            }
            let pressed = key_event.is_pressed();
            match key_event.get_keycode() {
                Key::BRACKETLEFT => {
                    self.set_button(EditorButton::ShrinkRadius, pressed);
                    if !pressed {
                        self.sync_size_slider();
                    }
                    return AfterGuiInput::STOP.ord();
                }
                Key::BRACKETRIGHT => {
                    self.set_button(EditorButton::GrowRadius, pressed);
                    if !pressed {
                        self.sync_size_slider();
                    }
                    return AfterGuiInput::STOP.ord();
                }
                Key::B if pressed => {
                    self.toggle_brush();
                    return AfterGuiInput::STOP.ord();
                }
                Key::KEY_1 if pressed => {
                    self.select_tool(BrushTool::Raise);
                    return AfterGuiInput::STOP.ord();
                }
                Key::KEY_2 if pressed => {
                    self.select_tool(BrushTool::Flatten);
                    return AfterGuiInput::STOP.ord();
                }
                Key::KEY_3 if pressed => {
                    self.select_tool(BrushTool::Smooth);
                    return AfterGuiInput::STOP.ord();
                }
                Key::KEY_4 if pressed => {
                    self.select_tool(BrushTool::Ramp);
                    return AfterGuiInput::STOP.ord();
                }
                _ => {}
            }
        }

        if !self.is_brush_enabled() {
            return AfterGuiInput::PASS.ord();
        }

        let Some(camera) = camera else {
            return AfterGuiInput::PASS.ord();
        };

        if let Ok(mouse_button) = event.clone().try_cast::<InputEventMouseButton>() {
            let button = match mouse_button.get_button_index() {
                MouseButton::LEFT => EditorButton::Primary,
                MouseButton::RIGHT => EditorButton::Secondary,
                _ => return AfterGuiInput::PASS.ord(),
            };
            self.update_cursor_ray(&camera, mouse_button.get_position());
            self.set_button(button, mouse_button.is_pressed());
            return AfterGuiInput::STOP.ord();
        }

        // Motion only moves the cursor; the camera keeps the event
        if let Ok(mouse_motion) = event.try_cast::<InputEventMouseMotion>() {
            self.update_cursor_ray(&camera, mouse_motion.get_position());
        }

        AfterGuiInput::PASS.ord()
    }
}

#[godot_api]
impl SculptTerrainPlugin {
    #[func]
    fn on_brush_toggled(&mut self, enabled: bool) {
        self.set_terrain_property("brush_enabled", enabled.to_variant());
        if !enabled {
            self.release_all_buttons();
        }
        godot_print!(
            "SculptTerrainPlugin: Brush {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    #[func]
    fn on_tool_0_pressed(&mut self) {
        self.select_tool(BrushTool::Raise);
    }

    #[func]
    fn on_tool_1_pressed(&mut self) {
        self.select_tool(BrushTool::Flatten);
    }

    #[func]
    fn on_tool_2_pressed(&mut self) {
        self.select_tool(BrushTool::Smooth);
    }

    #[func]
    fn on_tool_3_pressed(&mut self) {
        self.select_tool(BrushTool::Ramp);
    }

    #[func]
    fn on_brush_size_changed(&mut self, value: f64) {
        self.set_terrain_property("brush_size", (value as f32).to_variant());
    }

    #[func]
    fn on_brush_strength_changed(&mut self, value: f64) {
        self.set_terrain_property("brush_strength", (value as f32).to_variant());
    }

    #[func]
    fn on_toolbar_mouse_entered(&mut self) {
        self.call_terrain_method_with_args(
            "add_input_disable",
            &[InputDisable::Ui.index().to_variant()],
        );
    }

    #[func]
    fn on_toolbar_mouse_exited(&mut self) {
        self.call_terrain_method_with_args(
            "remove_input_disable",
            &[InputDisable::Ui.index().to_variant()],
        );
    }
}

impl SculptTerrainPlugin {
    fn set_ui_visible(&mut self, visible: bool) {
        if let Some(ref mut margin) = self.margin_container {
            margin.set_visible(visible);
        }
    }

    fn call_terrain_method_with_args(&mut self, method_name: &str, args: &[Variant]) -> Variant {
        if let Some(ref terrain) = self.current_terrain {
            if terrain.is_instance_valid() {
                let mut terrain_clone = terrain.clone();
                if terrain_clone.has_method(method_name) {
                    self.is_modifying = true;
                    let result = terrain_clone.call(method_name, args);
                    self.is_modifying = false;
                    return result;
                }
            }
        }
        Variant::nil()
    }

    fn set_terrain_property(&mut self, property: &str, value: Variant) {
        if let Some(ref terrain) = self.current_terrain {
            if terrain.is_instance_valid() {
                let mut terrain_clone = terrain.clone();
                terrain_clone.set(property, &value);
            }
        }
    }

    fn get_terrain_property(&self, property: &str) -> Variant {
        if let Some(ref terrain) = self.current_terrain {
            if terrain.is_instance_valid() {
                return terrain.clone().get(property);
            }
        }
        Variant::nil()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Brush UI Helpers
    // ═══════════════════════════════════════════════════════════════════════

    fn is_brush_enabled(&self) -> bool {
        self.get_terrain_property("brush_enabled")
            .try_to::<bool>()
            .unwrap_or(false)
    }

    fn toggle_brush(&mut self) {
        let new_value = !self.is_brush_enabled();
        self.set_terrain_property("brush_enabled", new_value.to_variant());
        if !new_value {
            self.release_all_buttons();
        }

        if let Some(ref mut btn) = self.brush_toggle_button {
            btn.set_pressed_no_signal(new_value);
        }

        godot_print!(
            "SculptTerrainPlugin: Brush {}",
            if new_value { "enabled" } else { "disabled" }
        );
    }

    fn select_tool(&mut self, tool: BrushTool) {
        self.set_terrain_property("brush_tool", tool.index().to_variant());
        self.update_tool_buttons(tool);
    }

    fn update_tool_buttons(&mut self, selected: BrushTool) {
        for (i, btn_opt) in self.tool_buttons.iter_mut().enumerate() {
            if let Some(ref mut btn) = btn_opt {
                btn.set_pressed_no_signal(i as i32 == selected.index());
            }
        }
    }

    fn sync_size_slider(&mut self) {
        let size = self
            .get_terrain_property("brush_size")
            .try_to::<f32>()
            .unwrap_or(5.0);
        if let Some(ref mut slider) = self.brush_size_slider {
            slider.set_value_no_signal(size as f64);
        }
    }

    /// Sync UI state from terrain node (called when selecting terrain)
    fn sync_ui_from_terrain(&mut self) {
        let brush_enabled = self.is_brush_enabled();
        if let Some(ref mut btn) = self.brush_toggle_button {
            btn.set_pressed_no_signal(brush_enabled);
        }

        let tool = self
            .get_terrain_property("brush_tool")
            .try_to::<i32>()
            .ok()
            .and_then(BrushTool::from_index)
            .unwrap_or_default();
        self.update_tool_buttons(tool);

        let max_size = self
            .call_terrain_method_with_args("get_max_brush_size", &[])
            .try_to::<f32>()
            .unwrap_or(50.0);
        if let Some(ref mut slider) = self.brush_size_slider {
            slider.set_max(max_size as f64);
        }
        self.sync_size_slider();

        let strength = self
            .get_terrain_property("brush_strength")
            .try_to::<f32>()
            .unwrap_or(40.0);
        if let Some(ref mut slider) = self.brush_strength_slider {
            slider.set_value_no_signal(strength as f64);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Brush Input Helpers
    // ═══════════════════════════════════════════════════════════════════════

    fn set_button(&mut self, button: EditorButton, pressed: bool) {
        self.call_terrain_method_with_args(
            "set_button",
            &[button.index().to_variant(), pressed.to_variant()],
        );
    }

    /// Release every button so no stroke outlives the plugin's focus
    fn release_all_buttons(&mut self) {
        for button in EditorButton::ALL {
            self.set_button(button, false);
        }
    }

    /// Hand the camera ray through `screen_pos` to the terrain
    fn update_cursor_ray(&mut self, camera: &Gd<Camera3D>, screen_pos: Vector2) {
        let ray_origin = camera.project_ray_origin(screen_pos);
        let ray_direction = camera.project_ray_normal(screen_pos);
        self.call_terrain_method_with_args(
            "set_cursor_ray",
            &[ray_origin.to_variant(), ray_direction.to_variant()],
        );
    }
}
